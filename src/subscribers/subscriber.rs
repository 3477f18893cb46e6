//! # Notice subscriber trait.
//!
//! Provides [`Subscribe`], the extension point for plugging custom notice
//! handlers into the [`Runner`](crate::Runner).
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently of the host loop)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `NoticeKind::SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_notice()
//!                                    └─► panic caught → NoticeKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the notice **for this subscriber only** and publishes
//!   `NoticeKind::SubscriberOverflow`.
//! - Notices are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block the host loop or each other.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use planvisor::{Notice, NoticeKind, Subscribe};
//!
//! struct Faults;
//!
//! #[async_trait]
//! impl Subscribe for Faults {
//!     async fn on_notice(&self, n: &Notice) {
//!         if matches!(n.kind, NoticeKind::PlanFailed) {
//!             // page someone, count it, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "faults" }
//! }
//! ```

use async_trait::async_trait;

use crate::notices::Notice;

/// Notice subscriber for runtime observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor (it also runs the host loop).
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single notice.
    ///
    /// Called from a dedicated worker task, in FIFO order per subscriber.
    async fn on_notice(&self, notice: &Notice);

    /// Name used in logs and in overflow/panic notices.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
