pub mod actions;
pub mod collector;
pub mod config;
pub mod diff;
pub mod error;
pub mod host;
pub mod launcher;
pub mod logging;
pub mod presentation;
pub mod refresh;
pub mod session;
pub mod settings;
pub mod view;

pub use actions::{ActionContext, ActionId, ActionRegistry, ActionResult, PopupAction};
pub use collector::{ResultSnapshot, UsageCollector, UsageEntry, UsagePredicate, UsageTransform};
pub use config::{Keymap, ShowUsagesConfig};
pub use error::{Result, ShowUsagesError};
pub use host::{Hint, HintKind, PopupHost};
pub use launcher::{Invocation, ShowUsages, ShowUsagesBuilder};
pub use presentation::{PopupRow, PopupView, Title, TitleSpan};
pub use session::{SessionHandle, SessionOutcome, SessionParams, SessionState, UserAction};
pub use settings::{DisplaySettings, DisplaySettingsStore};
pub use view::{GroupedUsageView, ViewFactory};
