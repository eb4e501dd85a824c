//! Core library for mockexam
//!
//! This crate implements the **Functional Core** of the mockexam application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`mockexam_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: Page text extraction from PDF documents
//! - **`mockexam`**: File I/O, session persistence and the CLI (the Imperative Shell)
//!
//! Every function here is deterministic: the shell passes in page texts, pasted
//! key text and the current time, and gets back plain values plus [`notice::Notice`]s
//! describing anything that degraded along the way. Nothing in this crate fails
//! on malformed input; it produces a best-effort partial result instead.
//!
//! # Pipeline
//!
//! 1. [`segment`]: pages to text blocks (interleaved languages, columns, script filter)
//! 2. [`question`]: text blocks to [`types::Question`] records
//! 3. [`answer_key`]: key text to an [`types::AnswerKey`]
//! 4. [`score`]: reconciliation and scoring against the user's [`types::Answers`]
//! 5. [`report`]: paginated score report
//!
//! [`session`] threads these stages through a single serializable value object,
//! and [`config`] holds the exam settings.
//!
//! # Example Usage
//!
//! ```rust
//! use mockexam_core::answer_key::parse_key_lines;
//! use mockexam_core::question::parse_questions;
//! use mockexam_core::score::{evaluate, MarkingScheme};
//! use mockexam_core::types::Answers;
//!
//! let questions = parse_questions("1) What is 2+2?\nA. 3\nB. 4\nC. 5");
//! let key = parse_key_lines("1 B");
//! let answers: Answers = [("1", "B")].into_iter().collect();
//!
//! let report = evaluate(&questions, &answers, &key, &MarkingScheme::default());
//! assert!(report.details[0].is_correct);
//! ```

pub mod answer_key;
pub mod config;
pub mod notice;
pub mod question;
pub mod report;
pub mod score;
pub mod segment;
pub mod session;
pub mod types;
