//! # Input events consumed by plans.
//!
//! The host time-stamps every occurrence from its input system and hands it to
//! plans as an [`Event`]: a time plus a tagged [`Input`] from a small closed
//! vocabulary.
//!
//! ## Contents
//! - [`Event`], [`Input`], [`EventKind`] the vocabulary itself
//! - [`MidiKind`] controller kinds carried by MIDI inputs
//!
//! A distinguished [`Input::Tick`] carries no payload and exists so that plans
//! can poll periodically; the host pushes one into every plan each turn.

mod event;

pub use event::{Event, EventKind, Input, MidiKind};
