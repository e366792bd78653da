//! gdocmd-blocks: block model and Markdown emitter for gdocmd
//!
//! This crate provides:
//! - A flat block model (headings, paragraphs, list items with depth, tables, code blocks)
//! - Inline spans carrying bold/italic/underline/strikethrough/code/link attributes
//! - Serialization of a block sequence to Markdown
//!
//! ## Example
//!
//! ```rust
//! use gdocmd_blocks::{Block, BlockSequence, Span, WriterOptions, blocks_to_markdown};
//!
//! let doc = BlockSequence::new(vec![
//!     Block::heading(1, vec![Span::plain("Hello")]),
//!     Block::paragraph(vec![Span::plain("World")]),
//! ]);
//!
//! let md = blocks_to_markdown(&doc, &WriterOptions::default());
//! assert!(md.contains("# Hello"));
//! ```

pub mod blocks;
pub mod writer;

pub use blocks::{
    Block, BlockSequence, CodeBlock, Heading, ListItem, Paragraph, Span, SpanStyle, Table,
    TableCell, TableRow, merge_adjacent,
};
pub use writer::{UnderlineStyle, WriterOptions, blocks_to_markdown, escape_table_cell, escape_text};
