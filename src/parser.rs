//! Reads the ADC2019 problem and answer text formats (spec.md §6).
//!
//! Errors are collected rather than returned on the first failure — a
//! single malformed line does not stop the parser from reporting every
//! other problem in the file, mirroring the reference `Adc2019Parser`.

use std::collections::HashMap;

use log::warn;
use thiserror::Error;

use crate::answer::Answer;
use crate::position::Position;
use crate::problem::Problem;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("line {line}: duplicated 'SIZE' line, previously defined at line {first_line}")]
    DuplicatedSize { first_line: usize, line: usize },

    #[error("line {line}: duplicated 'BLOCK_NUM' line, previously defined at line {first_line}")]
    DuplicatedBlockNum { first_line: usize, line: usize },

    #[error("line {line}: row has {actual} cells, expected {expected}")]
    RowCountMismatch { line: usize, expected: usize, actual: usize },

    #[error("expected BLOCK#{expected_id} but input ended first")]
    MissingBlockLine { expected_id: u32 },

    #[error("line {line}: syntax error: {text}")]
    Syntax { line: usize, text: String },
}

/// A cursor over a text file's lines, 1-indexed to match the error
/// messages a human editing the file would expect.
struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str) -> Self {
        LineCursor { lines: input.lines().collect(), pos: 0 }
    }

    /// The next line verbatim, blank or not.
    fn next_raw(&mut self) -> Option<(usize, &'a str)> {
        if self.pos >= self.lines.len() {
            return None;
        }
        let line_no = self.pos + 1;
        let text = self.lines[self.pos];
        self.pos += 1;
        Some((line_no, text))
    }

    /// The next non-blank line, trimmed.
    fn next_meaningful(&mut self) -> Option<(usize, &'a str)> {
        loop {
            let (line_no, text) = self.next_raw()?;
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some((line_no, trimmed));
            }
        }
    }
}

fn strip_keyword_ci<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let line = line.trim_start();
    if line.len() < keyword.len() || !line[..keyword.len()].eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    let mut chars = rest.chars();
    if !chars.next()?.is_whitespace() {
        return None;
    }
    Some(rest.trim_start())
}

fn strip_exact_prefix<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let line = line.trim_start();
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn parse_dims(text: &str) -> Option<(usize, usize)> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let idx = compact.find(['x', 'X'])?;
    let w = compact[..idx].parse::<usize>().ok().filter(|&w| w > 0)?;
    let h = compact[idx + 1..].parse::<usize>().ok().filter(|&h| h > 0)?;
    Some((w, h))
}

/// `SIZE WxH` (case-insensitive keyword, free spacing around `x`).
fn parse_size(line: &str) -> Option<(usize, usize)> {
    parse_dims(strip_keyword_ci(line, "SIZE")?)
}

/// `BLOCK_NUM N`.
fn parse_block_num(line: &str) -> Option<usize> {
    strip_keyword_ci(line, "BLOCK_NUM")?.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

fn take_leading_block_id(rest: &str) -> Option<(u32, &str)> {
    let digit_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digit_end == 0 {
        return None;
    }
    let block_id: u32 = rest[..digit_end].parse().ok()?;
    if block_id == 0 {
        return None;
    }
    Some((block_id, &rest[digit_end..]))
}

/// `BLOCK#k bwXbh` (problem file block header).
fn parse_block_header(line: &str) -> Option<(u32, usize, usize)> {
    let rest = strip_exact_prefix(line, "BLOCK#")?;
    let (block_id, after_id) = take_leading_block_id(rest)?;
    if !after_id.starts_with(char::is_whitespace) {
        return None;
    }
    let (w, h) = parse_dims(after_id)?;
    Some((block_id, w, h))
}

/// `BLOCK#k @(x,y)` (answer file block placement line).
fn parse_block_answer_header(line: &str) -> Option<(u32, Position)> {
    let rest = strip_exact_prefix(line, "BLOCK#")?;
    let (block_id, after_id) = take_leading_block_id(rest)?;
    if !after_id.starts_with(char::is_whitespace) {
        return None;
    }
    let after_id = strip_exact_prefix(after_id, "@")?;
    let inner = after_id.trim_start().strip_prefix('(')?;
    let close = inner.find(')')?;
    let (xs, ys) = inner[..close].split_once(',')?;
    let x: i32 = xs.trim().parse().ok()?;
    let y: i32 = ys.trim().parse().ok()?;
    Some((block_id, Position::new(x, y)))
}

fn push_err(errors: &mut Vec<ParseError>, err: ParseError) {
    warn!("{err}");
    errors.push(err);
}

/// Parses a problem file (spec.md §6). On any malformed line, the errors
/// found across the whole file are returned together; a well-formed file
/// always yields `Ok`.
pub fn read_problem(input: &str) -> Result<Problem, Vec<ParseError>> {
    let mut cursor = LineCursor::new(input);
    let mut errors = Vec::new();
    let mut size_line: Option<usize> = None;
    let mut block_num_line: Option<usize> = None;
    let mut declared_block_num: Option<usize> = None;
    let mut problem: Option<Problem> = None;

    while let Some((line_no, text)) = cursor.next_meaningful() {
        if let Some((w, h)) = parse_size(text) {
            match size_line {
                Some(first) => {
                    push_err(&mut errors, ParseError::DuplicatedSize { first_line: first, line: line_no })
                }
                None => {
                    size_line = Some(line_no);
                    problem = Some(Problem::new(w, h));
                }
            }
            continue;
        }

        if let Some(n) = parse_block_num(text) {
            match block_num_line {
                Some(first) => push_err(
                    &mut errors,
                    ParseError::DuplicatedBlockNum { first_line: first, line: line_no },
                ),
                None => {
                    block_num_line = Some(line_no);
                    declared_block_num = Some(n);
                }
            }
            continue;
        }

        if let Some((block_id, bw, bh)) = parse_block_header(text) {
            let Some(problem_ref) = problem.as_mut() else {
                push_err(
                    &mut errors,
                    ParseError::Syntax { line: line_no, text: "BLOCK before SIZE".into() },
                );
                continue;
            };

            let mut pos_list = Vec::new();
            let mut label_dict = HashMap::new();
            for y in 0..bh {
                let Some((row_line_no, row_text)) = cursor.next_raw() else {
                    push_err(&mut errors, ParseError::MissingBlockLine { expected_id: block_id });
                    break;
                };
                let cells: Vec<&str> = row_text.split(',').collect();
                if cells.len() != bw {
                    push_err(
                        &mut errors,
                        ParseError::RowCountMismatch { line: row_line_no, expected: bw, actual: cells.len() },
                    );
                    continue;
                }
                for (x, cell) in cells.iter().enumerate() {
                    let cell = cell.trim();
                    if cell == "+" {
                        let pos = Position::from_xy(x, y);
                        pos_list.push(pos);
                        label_dict.insert(pos, 0);
                    } else {
                        match cell.parse::<i32>() {
                            Ok(0) => {} // outside the block's region
                            Ok(label) => {
                                let pos = Position::from_xy(x, y);
                                pos_list.push(pos);
                                label_dict.insert(pos, label);
                            }
                            Err(_) => push_err(
                                &mut errors,
                                ParseError::Syntax { line: row_line_no, text: row_text.to_string() },
                            ),
                        }
                    }
                }
            }
            problem_ref.add_block(block_id, pos_list, label_dict);

            if let Some(n) = declared_block_num {
                if problem_ref.block_num() == n {
                    break;
                }
            }
            continue;
        }

        push_err(&mut errors, ParseError::Syntax { line: line_no, text: text.to_string() });
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    match problem {
        Some(p) => Ok(p),
        None => Err(vec![ParseError::Syntax { line: 0, text: "missing SIZE line".into() }]),
    }
}

/// Parses an answer file, given the block count the matching problem
/// declares (the answer format has no `BLOCK_NUM` line of its own).
pub fn read_answer(input: &str, block_num: usize) -> Result<Answer, Vec<ParseError>> {
    let mut cursor = LineCursor::new(input);
    let mut errors = Vec::new();

    let Some((line_no, size_line)) = cursor.next_meaningful() else {
        return Err(vec![ParseError::Syntax { line: 0, text: "expected SIZE line".into() }]);
    };
    let Some((w, h)) = parse_size(size_line) else {
        return Err(vec![ParseError::Syntax { line: line_no, text: size_line.to_string() }]);
    };

    let mut answer = Answer::new(w, h);
    for y in 0..h {
        let Some((line_no, row_text)) = cursor.next_meaningful() else {
            errors.push(ParseError::Syntax { line: 0, text: "unexpected end of file in grid".into() });
            return Err(errors);
        };
        let cells: Vec<&str> = row_text.split(',').collect();
        if cells.len() != w {
            push_err(
                &mut errors,
                ParseError::RowCountMismatch { line: line_no, expected: w, actual: cells.len() },
            );
            continue;
        }
        for (x, cell) in cells.iter().enumerate() {
            let cell = cell.trim();
            if cell != "+" {
                match cell.parse::<i32>() {
                    Ok(label) => answer.set_label(Position::from_xy(x, y), label),
                    Err(_) => push_err(
                        &mut errors,
                        ParseError::Syntax { line: line_no, text: row_text.to_string() },
                    ),
                }
            }
        }
    }

    for expected_id in 1..=block_num as u32 {
        let Some((line_no, row_text)) = cursor.next_meaningful() else {
            errors.push(ParseError::MissingBlockLine { expected_id });
            return Err(errors);
        };
        match parse_block_answer_header(row_text) {
            Some((block_id, pos)) if block_id == expected_id => {
                answer.set_block_pos(block_id, pos);
            }
            Some((block_id, _)) => push_err(
                &mut errors,
                ParseError::Syntax {
                    line: line_no,
                    text: format!("expected BLOCK#{expected_id}, found BLOCK#{block_id}"),
                },
            ),
            None => {
                push_err(&mut errors, ParseError::Syntax { line: line_no, text: row_text.to_string() })
            }
        }
    }

    if errors.is_empty() { Ok(answer) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_accepts_a_well_formed_problem() {
        let input = "SIZE 3X3\nBLOCK_NUM 1\nBLOCK#1 2X2\n 1, +\n +, 2\n";
        let problem = read_problem(input).expect("should parse");
        assert_eq!(problem.max_width(), 3);
        assert_eq!(problem.max_height(), 3);
        assert_eq!(problem.block_num(), 1);
        assert_eq!(problem.terminals(1), &[(1, Position::new(0, 0))]);
        assert_eq!(problem.terminals(2), &[(1, Position::new(1, 1))]);
    }

    #[test]
    fn s4_rejects_duplicate_size() {
        let input = "SIZE 3X3\nSIZE 4X4\nBLOCK_NUM 0\n";
        let errors = read_problem(input).unwrap_err();
        assert!(matches!(errors[0], ParseError::DuplicatedSize { first_line: 1, line: 2 }));
    }

    #[test]
    fn rejects_row_width_mismatch() {
        let input = "SIZE 2X2\nBLOCK_NUM 1\nBLOCK#1 2X1\n+\n";
        let errors = read_problem(input).unwrap_err();
        assert!(matches!(errors[0], ParseError::RowCountMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn case_insensitive_keywords_and_spacing() {
        let input = "size 2 X 2\nblock_num 1\nblock#1 2 x 1\n+, +\n";
        let problem = read_problem(input).expect("should parse");
        assert_eq!(problem.max_width(), 2);
        assert_eq!(problem.block_num(), 1);
    }

    #[test]
    fn round_trips_answer_file() {
        let input = "SIZE 3X1\n 1, 1, 1\nBLOCK#1 @(0,0)\nBLOCK#2 @(2,0)\n";
        let answer = read_answer(input, 2).expect("should parse");
        assert_eq!(answer.label_xy(1, 0), 1);
        assert_eq!(answer.block_pos(1), Position::new(0, 0));
        assert_eq!(answer.block_pos(2), Position::new(2, 0));
    }

    #[test]
    fn answer_missing_block_line_is_fatal() {
        let input = "SIZE 1X1\n 0\n";
        let errors = read_answer(input, 1).unwrap_err();
        assert!(matches!(errors[0], ParseError::MissingBlockLine { expected_id: 1 }));
    }
}
