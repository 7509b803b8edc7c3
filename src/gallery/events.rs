use serde::Serialize;

/// Change notifications published by every gallery model.
///
/// Each model owns one broadcast channel; dropping a receiver unsubscribes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, strum::AsRefStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GalleryEvent {
    /// First successful population. Sent once per model.
    Starts,
    /// The sequence changed and is safe to re-render.
    Load,
    /// A fetch or merge failed; the window was left as it was.
    Error { message: String },
}

/// Capacity of each model's event channel. Slow receivers skip ahead.
pub(crate) const EVENT_CAPACITY: usize = 64;
