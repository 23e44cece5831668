/*!
 * # Editing Core
 *
 * Everything between a keystroke and a published template string.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the Host Document
 * - The live [`Document`](crate::models::Document) and selection are owned by a
 *   [`HostDocument`] implementation (the in-memory [`EditorDocument`] ships here)
 * - Every mutation names its [`Source`]; silent mutations queue no notification
 * - Nothing else keeps a second copy across notifications
 *
 * ### 2. Transformation
 * - [`transform`] is a pure pass turning `{{...}}` tokens in text runs into
 *   marker embeds, used once when content is mounted
 *
 * ### 3. Live Reconciliation
 * - The [`Reconciler`] runs after every committed edit, swaps matches for a
 *   marker plus a separator space using silent mutations, places and clamps
 *   the caret, then renders the projection
 * - An `Idle`/`Reconciling` state machine drops notifications that arrive
 *   while a pass is running
 *
 * ### 4. Output
 * - The projection renders markers as their token text (what gets stored)
 * - The copy override puts chip markup of the whole surface on the clipboard
 *
 * ## Module Structure
 *
 * - **`host`**: `HostDocument` contract, `Selection`, `Source`, events
 * - **`document`**: in-memory `EditorDocument`
 * - **`registry`**: embed type registration
 * - **`transform`**: pure token-to-marker transformation
 * - **`reconciler`**: live-edit reconciliation and caret policy
 * - **`clipboard`**: copy override
 * - **`session`**: `EditorSession` wiring input, dispatch and publishing
 *
 * ## Usage Pattern
 *
 * ```rust
 * use template_chips_engine::editing::*;
 *
 * let mut session = EditorSession::new(ReconcilerOptions::default()).unwrap();
 * session.mount(Seed::PlainText("Hello {{user}} ".to_string())).unwrap();
 * assert_eq!(session.projection(), "Hello {{user}} ");
 *
 * session.select_all();
 * let copied = session.copy().unwrap();
 * assert!(copied.html.contains("dynamic-variable"));
 * ```
 */

pub mod clipboard;
pub mod document;
pub mod host;
pub mod reconciler;
pub mod registry;
pub mod session;
pub mod transform;

pub use clipboard::{ClipboardPayload, copy_override};
pub use document::EditorDocument;
pub use host::{EditorEvent, HostDocument, Selection, Source};
pub use reconciler::{
    CaretGuard, ReconcileState, Reconciler, ReconcilerOptions, Reconciliation, SEPARATOR,
};
pub use registry::EmbedRegistry;
pub use session::{EditorSession, Seed};
pub use transform::{transform, transform_with};
