use std::collections::BTreeMap;

use thiserror::Error;

/// A syntax violation, located for the diagnostic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
  #[error("line {line}, column {col}: expected command `{expected}`")]
  InvalidCommand {
    line: u32,
    col: u32,
    expected: String,
  },
  #[error("line {line}, column {col}: expected a flag")]
  InvalidArgument { line: u32, col: u32 },
  #[error("line {line}, column {col}: unterminated {what}")]
  Unterminated {
    what: &'static str,
    line: u32,
    col: u32,
  },
}

/// What the scanner accepts: the command verb, the flag introducer, the
/// delimiter ending a flag name and an optional token that stops parsing.
#[derive(Debug, Clone)]
pub struct ScanConfig {
  pub verb: String,
  pub flag_introducer: char,
  pub flag_delim: char,
  pub stop_token: Option<String>,
}

impl ScanConfig {
  pub fn new(verb: &str) -> Self {
    Self {
      verb: verb.to_string(),
      flag_introducer: '-',
      flag_delim: ' ',
      stop_token: None,
    }
  }
}

/// Reads one argument starting at the current position. Installed per
/// first character; anything without a reader is taken up to the next
/// whitespace.
pub type ArgReader = fn(&mut Scanner) -> Result<String, ScanError>;

/// One recognized command: its source line and a map from flag name to the
/// arguments that followed it. A repeated flag overwrites its earlier
/// occurrence.
#[derive(Debug, Clone)]
pub struct Command {
  pub line: u32,
  pub flags: BTreeMap<String, Vec<String>>,
}

impl Command {
  pub fn has(&self, flag: &str) -> bool {
    self.flags.contains_key(flag)
  }

  pub fn args(&self, flag: &str) -> &[String] {
    self.flags.get(flag).map_or(&[], |v| v.as_slice())
  }
}

enum State {
  Init,
  ReadWs,
  ReadLineComment,
  ReadMlComment,
  FoundCmd,
  ReadArgs,
  Done,
}

/// Line-oriented state machine over a whole directive file.
pub struct Scanner {
  chars: Vec<char>,
  pos: usize,
  line: u32,
  line_start: usize,
  cfg: ScanConfig,
  readers: BTreeMap<char, ArgReader>,
}

impl Scanner {
  pub fn new(source: &str, cfg: ScanConfig) -> Self {
    Self {
      chars: source.chars().collect(),
      pos: 0,
      line: 1,
      line_start: 0,
      cfg,
      readers: BTreeMap::new(),
    }
  }

  pub fn add_reader(&mut self, first_char: char, reader: ArgReader) {
    self.readers.insert(first_char, reader);
  }

  pub fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<char> {
    self.chars.get(self.pos + offset).copied()
  }

  pub fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += 1;
    if c == '\n' {
      self.line += 1;
      self.line_start = self.pos;
    }
    Some(c)
  }

  /// Current (line, column), both 1-based.
  pub fn location(&self) -> (u32, u32) {
    (self.line, (self.pos - self.line_start + 1) as u32)
  }

  fn at_end(&self) -> bool {
    self.pos >= self.chars.len()
  }

  fn rest_starts_with(&self, token: &str) -> bool {
    let mut i = self.pos;
    for c in token.chars() {
      if self.chars.get(i).copied() != Some(c) {
        return false;
      }
      i += 1;
    }
    true
  }

  /// The verb only counts at a token boundary, so an argument merely
  /// prefixed by it does not end the command.
  fn at_verb(&self) -> bool {
    if !self.rest_starts_with(&self.cfg.verb) {
      return false;
    }
    let after = self.pos + self.cfg.verb.chars().count();
    self.chars.get(after).map_or(true, |c| c.is_whitespace())
  }

  fn at_stop(&self) -> bool {
    match &self.cfg.stop_token {
      Some(stop) if !stop.is_empty() => self.rest_starts_with(stop),
      _ => false,
    }
  }

  fn skip_ws(&mut self) {
    while matches!(self.peek(), Some(c) if c.is_whitespace()) {
      self.bump();
    }
  }

  fn skip_line_comment(&mut self) {
    while let Some(c) = self.peek() {
      if c == '\n' {
        break;
      }
      self.bump();
    }
  }

  fn skip_block_comment(&mut self) -> Result<(), ScanError> {
    let (line, col) = self.location();
    self.bump();
    self.bump();
    loop {
      if self.at_end() {
        return Err(ScanError::Unterminated {
          what: "block comment",
          line,
          col,
        });
      }
      if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
        self.bump();
        self.bump();
        return Ok(());
      }
      self.bump();
    }
  }

  /// Skips whitespace and both comment forms.
  fn skip_trivia(&mut self) -> Result<(), ScanError> {
    loop {
      self.skip_ws();
      match (self.peek(), self.peek_at(1)) {
        (Some('#'), _) => self.skip_line_comment(),
        (Some('/'), Some('*')) => self.skip_block_comment()?,
        _ => return Ok(()),
      }
    }
  }

  fn read_word(&mut self) -> String {
    let mut word = String::new();
    while let Some(c) = self.peek() {
      if c.is_whitespace() {
        break;
      }
      word.push(c);
      self.bump();
    }
    word
  }

  fn read_flag(&mut self) -> Result<(String, Vec<String>), ScanError> {
    if self.peek() != Some(self.cfg.flag_introducer) {
      let (line, col) = self.location();
      return Err(ScanError::InvalidArgument { line, col });
    }
    self.bump();
    let name = self.read_word();
    let mut args = Vec::new();
    loop {
      self.skip_trivia()?;
      if self.at_end() || self.at_stop() || self.at_verb() {
        break;
      }
      let Some(c) = self.peek() else { break };
      if c == self.cfg.flag_introducer {
        break;
      }
      let arg = match self.readers.get(&c).copied() {
        Some(reader) => reader(self)?,
        None => self.read_word(),
      };
      args.push(arg);
    }
    Ok((name, args))
  }

  /// Runs the machine over the whole input and yields the recognized
  /// commands in file order.
  pub fn scan(mut self) -> Result<Vec<Command>, ScanError> {
    let mut commands: Vec<Command> = Vec::new();
    let mut state = State::Init;
    loop {
      state = match state {
        State::Init => State::ReadWs,
        State::ReadWs => {
          self.skip_ws();
          match (self.peek(), self.peek_at(1)) {
            (None, _) => State::Done,
            (Some('#'), _) => State::ReadLineComment,
            (Some('/'), Some('*')) => State::ReadMlComment,
            _ if self.at_stop() => State::Done,
            _ => State::FoundCmd,
          }
        }
        State::ReadLineComment => {
          self.skip_line_comment();
          State::ReadWs
        }
        State::ReadMlComment => {
          self.skip_block_comment()?;
          State::ReadWs
        }
        State::FoundCmd => {
          if !self.at_verb() {
            let (line, col) = self.location();
            return Err(ScanError::InvalidCommand {
              line,
              col,
              expected: self.cfg.verb.clone(),
            });
          }
          let line = self.line;
          for _ in 0..self.cfg.verb.chars().count() {
            self.bump();
          }
          commands.push(Command {
            line,
            flags: BTreeMap::new(),
          });
          State::ReadArgs
        }
        State::ReadArgs => {
          self.skip_trivia()?;
          if self.at_end() || self.at_stop() {
            State::Done
          } else if self.at_verb() {
            State::FoundCmd
          } else {
            let (flag, args) = self.read_flag()?;
            if let Some(cmd) = commands.last_mut() {
              cmd.flags.insert(flag, args);
            }
            State::ReadArgs
          }
        }
        State::Done => break,
      };
    }
    Ok(commands)
  }
}

/// Extracts a `"…"` argument, quotes dropped.
pub fn quoted_reader(s: &mut Scanner) -> Result<String, ScanError> {
  let (line, col) = s.location();
  s.bump();
  let mut arg = String::new();
  loop {
    match s.bump() {
      None => {
        return Err(ScanError::Unterminated {
          what: "quoted argument",
          line,
          col,
        })
      }
      Some('"') => return Ok(arg),
      Some(c) => arg.push(c),
    }
  }
}

/// Extracts a `{…}` argument, braces dropped.
pub fn braced_reader(s: &mut Scanner) -> Result<String, ScanError> {
  let (line, col) = s.location();
  s.bump();
  let mut arg = String::new();
  loop {
    match s.bump() {
      None => {
        return Err(ScanError::Unterminated {
          what: "braced argument",
          line,
          col,
        })
      }
      Some('}') => return Ok(arg),
      Some(c) => arg.push(c),
    }
  }
}
