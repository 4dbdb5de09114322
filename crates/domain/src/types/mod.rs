//! Domain types and models

pub mod analysis;
pub mod app;
pub mod buckets;
pub mod classification;
pub mod goals;
pub mod input;
pub mod web;

pub use analysis::{
    DailyReport, EfficiencyBreakdown, FocusSession, HourlyUsage, InputSummary, Insight,
    InsightKind, InsightPriority, UsagePattern, UsagePatternType,
};
pub use app::{AppSession, ResolvedApp, WindowBounds, WindowGeometry};
pub use buckets::{
    BucketKey, ClickCluster, KeyboardSession, MouseSession, MouseTrail, ShortcutUsage, TrailPoint,
    TypingBurst,
};
pub use classification::{CategoryRule, Classification, ContextType};
pub use goals::{GoalTargetType, UserGoal};
pub use input::{
    CaptureEvent, KeyCode, MouseButton, RawInputEvent, RawInputKind, ScreenPoint, WindowHandle,
};
pub use web::{
    ClientId, WebActivityEvent, WebActivityKind, WebSession, WebSessionKey, WebSessionParams,
};
