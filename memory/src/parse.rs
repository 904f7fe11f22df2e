use std::path::Path;
use std::{fmt, fs, io};

use crate::rules::{BramType, MatchRule, Rules};

#[derive(Debug)]
pub enum ParseError {
    Io(io::Error),
    Syntax { line: usize, text: String },
    UnexpectedEof { line: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Io(error) => write!(f, "can't read rules file: {}", error),
            ParseError::Syntax { line, text } => write!(f, "syntax error in rules file line {}: {}", line, text),
            ParseError::UnexpectedEof { line } => write!(f, "unexpected end of rules file in line {}", line),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<io::Error> for ParseError {
    fn from(error: io::Error) -> Self {
        ParseError::Io(error)
    }
}

struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    tokens: Vec<&'a str>,
    line_number: usize,
    at_eof: bool,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser { lines: text.lines().enumerate(), tokens: vec![], line_number: 0, at_eof: false }
    }

    /// Advances to the next line with any tokens on it.  Whitespace
    /// separates tokens; a token starting with `#` comments out the rest of
    /// the line.
    fn next_line(&mut self) -> bool {
        for (index, line) in self.lines.by_ref() {
            self.line_number = index + 1;
            self.tokens = line.split_whitespace().take_while(|token| !token.starts_with('#')).collect();
            if !self.tokens.is_empty() {
                return true;
            }
        }
        self.line_number += 1;
        self.at_eof = true;
        false
    }

    fn syntax_error<T>(&self) -> Result<T, ParseError> {
        if self.at_eof {
            Err(ParseError::UnexpectedEof { line: self.line_number })
        } else {
            Err(ParseError::Syntax { line: self.line_number, text: self.tokens.join(" ") })
        }
    }

    fn int<T: std::str::FromStr>(&self, token: &str) -> Result<T, ParseError> {
        token.parse().or_else(|_| self.syntax_error())
    }

    fn int_vect<T: std::str::FromStr>(&self, tokens: &[&str]) -> Result<Vec<T>, ParseError> {
        tokens.iter().map(|token| self.int(token)).collect()
    }

    fn parse_bram(&mut self) -> Result<BramType, ParseError> {
        if self.tokens.len() != 2 {
            return self.syntax_error();
        }
        let mut bram = BramType { name: self.tokens[1].to_string(), ..Default::default() };
        loop {
            if !self.next_line() {
                return self.syntax_error();
            }
            match self.tokens.as_slice() {
                ["endbram"] => return Ok(bram),
                ["init", value] => bram.init = self.int::<usize>(value)? != 0,
                ["abits", value] => bram.abits = self.int(value)?,
                ["dbits", value] => bram.dbits = self.int(value)?,
                ["groups", value] => bram.groups = self.int(value)?,
                ["ports", values @ ..] if !values.is_empty() => bram.ports = self.int_vect(values)?,
                ["wrmode", values @ ..] if !values.is_empty() => {
                    bram.wrmode = self.int_vect::<usize>(values)?.into_iter().map(|mode| mode != 0).collect()
                }
                ["enable", values @ ..] if !values.is_empty() => bram.enable = self.int_vect(values)?,
                ["transp", values @ ..] if !values.is_empty() => bram.transp = self.int_vect(values)?,
                ["clocks", values @ ..] if !values.is_empty() => bram.clocks = self.int_vect(values)?,
                ["clkpol", values @ ..] if !values.is_empty() => bram.clkpol = self.int_vect(values)?,
                _ => return self.syntax_error(),
            }
        }
    }

    fn parse_match(&mut self) -> Result<MatchRule, ParseError> {
        if self.tokens.len() != 2 {
            return self.syntax_error();
        }
        let mut rule = MatchRule { name: self.tokens[1].to_string(), ..Default::default() };
        loop {
            if !self.next_line() {
                return self.syntax_error();
            }
            match self.tokens.as_slice() {
                ["endmatch"] => return Ok(rule),
                ["min", key, value] => {
                    rule.min_limits.insert(key.to_string(), self.int(value)?);
                }
                ["max", key, value] => {
                    rule.max_limits.insert(key.to_string(), self.int(value)?);
                }
                _ => return self.syntax_error(),
            }
        }
    }

    fn parse(mut self) -> Result<Rules, ParseError> {
        let mut rules = Rules::default();
        while self.next_line() {
            let keyword = self.tokens[0];
            match keyword {
                "bram" => {
                    let bram = self.parse_bram()?;
                    rules.brams.insert(bram.name.clone(), bram);
                }
                "match" => {
                    let rule = self.parse_match()?;
                    rules.matches.push(rule);
                }
                _ => return self.syntax_error(),
            }
        }
        Ok(rules)
    }
}

impl Rules {
    pub fn parse(text: &str) -> Result<Rules, ParseError> {
        Parser::new(text).parse()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Rules, ParseError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}
