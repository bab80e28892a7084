use std::ops::BitOrAssign;

/// A kind of token found on a line while scanning a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Open,
    Close,
    Comment,
}

impl TokenKind {
    const fn bit(self) -> u8 {
        match self {
            TokenKind::Name => 0b0001,
            TokenKind::Open => 0b0010,
            TokenKind::Close => 0b0100,
            TokenKind::Comment => 0b1000,
        }
    }
}

/// Set of token kinds seen on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenKinds(u8);

impl TokenKinds {
    pub const fn empty() -> Self {
        TokenKinds(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, kind: TokenKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: TokenKind) {
        self.0 |= kind.bit();
    }
}

impl From<TokenKind> for TokenKinds {
    fn from(kind: TokenKind) -> Self {
        TokenKinds(kind.bit())
    }
}

impl From<Option<TokenKind>> for TokenKinds {
    fn from(kind: Option<TokenKind>) -> Self {
        kind.map_or_else(TokenKinds::empty, TokenKinds::from)
    }
}

impl BitOrAssign<TokenKind> for TokenKinds {
    fn bitor_assign(&mut self, kind: TokenKind) {
        self.insert(kind);
    }
}

/// One physical input line that belongs to the block being scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLine {
    pub text: String,
    pub kinds: TokenKinds,
    /// 1-based line number in the input.
    pub line_no: usize,
}

/// Lines of the block currently being scanned, in input order.
#[derive(Debug, Default)]
pub struct CurrentBlock {
    lines: Vec<BlockLine>,
}

impl CurrentBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[BlockLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn first(&self) -> Option<&BlockLine> {
        self.lines.first()
    }

    pub fn last(&self) -> Option<&BlockLine> {
        self.lines.last()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub(crate) fn push(&mut self, line: BlockLine) {
        self.lines.push(line);
    }

    /// Merge `kind` into the most recently recorded line, if any.
    pub(crate) fn mark_last(&mut self, kind: Option<TokenKind>) {
        if let (Some(last), Some(kind)) = (self.lines.last_mut(), kind) {
            last.kinds |= kind;
        }
    }

    /// True if some line's text matches `re`.
    pub fn any_line_matches(&self, re: &regex::Regex) -> bool {
        self.lines.iter().any(|line| re.is_match(&line.text))
    }
}
