//! # Statement Parser
//!
//! Turns one input line into a [`Statement`]. The grammar is deliberately
//! small:
//!
//! ```text
//! insert <id> <username> <email>
//! select
//! ```
//!
//! `insert` is recognized by its first whitespace-separated token and takes
//! exactly three arguments (anything after the email is ignored). `select`
//! must be the entire input. Parse failures are values, not errors: the REPL
//! maps each [`PrepareError`] variant to its message and keeps running.

use crate::config::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};
use crate::table::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert { row: Row },
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareError {
    /// Missing tokens or an id that does not parse as an integer in range.
    SyntaxError,
    NegativeId,
    StringTooLong,
    /// The first token is not a known statement keyword.
    Unrecognized,
}

pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
    let mut tokens = input.split_whitespace();

    match tokens.next() {
        Some("insert") => {
            let (id, username, email) = match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(id), Some(username), Some(email)) => (id, username, email),
                _ => return Err(PrepareError::SyntaxError),
            };

            let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
            if id < 0 {
                return Err(PrepareError::NegativeId);
            }
            let id = u32::try_from(id).map_err(|_| PrepareError::SyntaxError)?;

            if username.len() > COLUMN_USERNAME_SIZE || email.len() > COLUMN_EMAIL_SIZE {
                return Err(PrepareError::StringTooLong);
            }

            Ok(Statement::Insert {
                row: Row::new(id, username, email),
            })
        }
        Some("select") => {
            if tokens.next().is_some() {
                return Err(PrepareError::Unrecognized);
            }
            Ok(Statement::Select)
        }
        _ => Err(PrepareError::Unrecognized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_parses_all_three_fields() {
        let statement = prepare("insert 1 user1 person1@example.com").unwrap();

        assert_eq!(
            statement,
            Statement::Insert {
                row: Row::new(1, "user1", "person1@example.com"),
            }
        );
    }

    #[test]
    fn select_parses() {
        assert_eq!(prepare("select").unwrap(), Statement::Select);
    }

    #[test]
    fn select_with_trailing_tokens_is_unrecognized() {
        assert_eq!(prepare("select *"), Err(PrepareError::Unrecognized));
    }

    #[test]
    fn missing_tokens_are_a_syntax_error() {
        assert_eq!(prepare("insert"), Err(PrepareError::SyntaxError));
        assert_eq!(prepare("insert 1"), Err(PrepareError::SyntaxError));
        assert_eq!(prepare("insert 1 user1"), Err(PrepareError::SyntaxError));
    }

    #[test]
    fn unparseable_id_is_a_syntax_error() {
        assert_eq!(
            prepare("insert abc user1 e@x.com"),
            Err(PrepareError::SyntaxError)
        );
        assert_eq!(
            prepare("insert 4294967296 user1 e@x.com"),
            Err(PrepareError::SyntaxError)
        );
    }

    #[test]
    fn negative_id_has_its_own_error() {
        assert_eq!(
            prepare("insert -1 foo bar"),
            Err(PrepareError::NegativeId)
        );
    }

    #[test]
    fn oversized_strings_are_rejected() {
        let long_username = "a".repeat(33);
        assert_eq!(
            prepare(&format!("insert 1 {} foo@bar", long_username)),
            Err(PrepareError::StringTooLong)
        );

        let long_email = "b".repeat(256);
        assert_eq!(
            prepare(&format!("insert 1 user1 {}", long_email)),
            Err(PrepareError::StringTooLong)
        );
    }

    #[test]
    fn maximum_length_strings_are_accepted() {
        let username = "a".repeat(32);
        let email = "b".repeat(255);

        let statement = prepare(&format!("insert 1 {} {}", username, email)).unwrap();

        match statement {
            Statement::Insert { row } => {
                assert_eq!(row.username, username);
                assert_eq!(row.email, email);
            }
            Statement::Select => panic!("expected insert"),
        }
    }

    #[test]
    fn unknown_keyword_is_unrecognized() {
        assert_eq!(prepare("delete 1"), Err(PrepareError::Unrecognized));
        assert_eq!(prepare("foo"), Err(PrepareError::Unrecognized));
    }

    #[test]
    fn extra_insert_tokens_are_ignored() {
        let statement = prepare("insert 1 user1 e@x.com trailing junk").unwrap();

        assert!(matches!(statement, Statement::Insert { .. }));
    }
}
