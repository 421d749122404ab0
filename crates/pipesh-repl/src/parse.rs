//! Line parser: `a b < in | c > out` to a [`Command`] chain.
//!
//! The line is cut at unquoted `|`, `<`, `>` and `>>`; each piece between
//! operators is split into words with POSIX quoting rules. Nothing else is
//! interpreted: no variables, globs or control flow.

use pipesh_kernel::Command;
use thiserror::Error;

/// Reasons a line cannot become a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("missing file name after `{0}`")]
    MissingTarget(&'static str),

    #[error("syntax error near `|`")]
    EmptyStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Pipe,
    Input,
    Output,
    Append,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Pipe => "|",
            Op::Input => "<",
            Op::Output => ">",
            Op::Append => ">>",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Words(Vec<String>),
    Op(Op),
}

/// Parse one input line.
///
/// Returns `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let mut stages: Vec<Command> = Vec::new();
    let mut current = Command::default();
    let mut pending: Option<Op> = None;

    for token in tokenize(line)? {
        match token {
            Token::Words(words) => {
                let mut words = words.into_iter();
                if let Some(op) = pending.take() {
                    let Some(target) = words.next() else {
                        return Err(ParseError::MissingTarget(op.symbol()));
                    };
                    current = match op {
                        Op::Input => current.redirect_input(target),
                        Op::Output => current.write_to(target),
                        Op::Append => current.append_to(target),
                        Op::Pipe => current,
                    };
                }
                current = current.arg(words.collect::<Vec<_>>());
            }
            Token::Op(op) => {
                if let Some(prev) = pending {
                    return Err(ParseError::MissingTarget(prev.symbol()));
                }
                if op == Op::Pipe {
                    if current.is_empty() {
                        return Err(ParseError::EmptyStage);
                    }
                    stages.push(std::mem::take(&mut current));
                } else {
                    pending = Some(op);
                }
            }
        }
    }

    if let Some(op) = pending {
        return Err(ParseError::MissingTarget(op.symbol()));
    }
    if current.is_empty() {
        if !stages.is_empty() {
            return Err(ParseError::EmptyStage);
        }
        // Redirects with no program are dropped along with the line.
        return Ok(None);
    }
    stages.push(current);

    let mut stages = stages.into_iter();
    let head = stages.next().unwrap_or_default();
    Ok(Some(stages.fold(head, |chain, next| chain.pipe_to(next))))
}

/// Cut `line` at unquoted operators and split each piece into words.
fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut piece = String::new();
    let mut chars = line.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => {
                quote = None;
                piece.push(c);
            }
            (Some('"'), '\\') | (None, '\\') => {
                piece.push(c);
                if let Some(escaped) = chars.next() {
                    piece.push(escaped);
                }
            }
            (Some(_), _) => piece.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                piece.push(c);
            }
            (None, '|' | '<' | '>') => {
                flush(&mut piece, &mut tokens)?;
                let op = match c {
                    '|' => Op::Pipe,
                    '<' => Op::Input,
                    _ if chars.peek() == Some(&'>') => {
                        chars.next();
                        Op::Append
                    }
                    _ => Op::Output,
                };
                tokens.push(Token::Op(op));
            }
            (None, _) => piece.push(c),
        }
    }

    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote);
    }
    flush(&mut piece, &mut tokens)?;
    Ok(tokens)
}

fn flush(piece: &mut String, tokens: &mut Vec<Token>) -> Result<(), ParseError> {
    let words = shlex::split(piece.as_str()).ok_or(ParseError::UnterminatedQuote)?;
    piece.clear();
    if !words.is_empty() {
        tokens.push(Token::Words(words));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn render(line: &str) -> String {
        parse_line(line).unwrap().map(|cmd| cmd.to_string()).unwrap_or_default()
    }

    #[rstest]
    #[case("echo hi", "echo hi")]
    #[case("  ls   -l  ", "ls -l")]
    #[case("a|b|c", "a | b | c")]
    #[case("cat < in.txt | tr a-z A-Z >> out.txt", "cat < in.txt | tr a-z A-Z >> out.txt")]
    #[case("sort<in>out", "sort < in > out")]
    #[case("echo a >out b", "echo a b > out")]
    #[case("echo 'a | b' \"c > d\"", "echo a | b c > d")]
    #[case("echo a\\|b", "echo a|b")]
    #[case("", "")]
    #[case("   ", "")]
    fn renders(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(render(line), expected);
    }

    #[rstest]
    #[case("echo 'open", ParseError::UnterminatedQuote)]
    #[case("echo \"open", ParseError::UnterminatedQuote)]
    #[case("cat <", ParseError::MissingTarget("<"))]
    #[case("echo >", ParseError::MissingTarget(">"))]
    #[case("echo >> | cat", ParseError::MissingTarget(">>"))]
    #[case("echo > > f", ParseError::MissingTarget(">"))]
    #[case("| cat", ParseError::EmptyStage)]
    #[case("echo |", ParseError::EmptyStage)]
    #[case("a || b", ParseError::EmptyStage)]
    fn rejects(#[case] line: &str, #[case] expected: ParseError) {
        assert_eq!(parse_line(line).unwrap_err(), expected);
    }

    #[test]
    fn quoted_words_keep_spaces() {
        let cmd = parse_line("printf '%s\\n' \"two words\"").unwrap().unwrap();
        assert_eq!(cmd.args(), &["printf", "%s\\n", "two words"]);
    }

    #[test]
    fn redirects_attach_to_their_stage() {
        let cmd = parse_line("cat < in | sort > out").unwrap().unwrap();
        let stages = cmd.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].input_redirect().map(|p| p.to_str().unwrap()), Some("in"));
        assert!(stages[0].output_redirect().is_none());
        assert!(stages[1].input_redirect().is_none());
        let out = stages[1].output_redirect().unwrap();
        assert_eq!(out.path.to_str(), Some("out"));
        assert!(!out.append);
    }

    #[test]
    fn redirect_without_program_is_blank() {
        assert_eq!(parse_line("> out").unwrap(), None);
    }
}
