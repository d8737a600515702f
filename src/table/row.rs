//! # Row Codec
//!
//! Rows are fixed-shape records serialized to exactly 293 bytes:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------
//! 0       4     id, little-endian u32
//! 4       33    username, NUL-padded
//! 37      256   email, NUL-padded
//! ```
//!
//! Text fields hold at most 32 and 255 bytes respectively, leaving room for
//! a terminating NUL even at maximum length. The statement parser enforces
//! the limits before a row is ever constructed from user input; the codec
//! re-checks them so an oversized field can never corrupt a page.

use std::fmt;

use eyre::{ensure, Result};

use crate::config::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, EMAIL_OFFSET, ID_OFFSET, ROW_SIZE, USERNAME_OFFSET,
    USERNAME_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    /// Serializes the row into its fixed on-page form.
    pub fn to_bytes(&self) -> Result<[u8; ROW_SIZE]> {
        ensure!(
            self.username.len() <= COLUMN_USERNAME_SIZE,
            "username exceeds {} bytes",
            COLUMN_USERNAME_SIZE
        );
        ensure!(
            self.email.len() <= COLUMN_EMAIL_SIZE,
            "email exceeds {} bytes",
            COLUMN_EMAIL_SIZE
        );

        let mut buf = [0u8; ROW_SIZE];
        buf[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&self.id.to_le_bytes());
        buf[USERNAME_OFFSET..USERNAME_OFFSET + self.username.len()]
            .copy_from_slice(self.username.as_bytes());
        buf[EMAIL_OFFSET..EMAIL_OFFSET + self.email.len()].copy_from_slice(self.email.as_bytes());
        Ok(buf)
    }

    /// Reads a row back from its on-page form.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        ensure!(
            buf.len() == ROW_SIZE,
            "row payload must be {} bytes, got {}",
            ROW_SIZE,
            buf.len()
        );

        let id = u32::from_le_bytes(
            buf[ID_OFFSET..ID_OFFSET + 4]
                .try_into()
                .map_err(|_| eyre::eyre!("row id field truncated"))?,
        );
        let username = read_padded_text(&buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let email = read_padded_text(&buf[EMAIL_OFFSET..ROW_SIZE]);

        Ok(Self {
            id,
            username,
            email,
        })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn read_padded_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
