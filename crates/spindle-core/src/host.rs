//! The host callback surface.
//!
//! The VM performs no I/O of its own. Every side effect is a synchronous
//! call through this trait: the windowing, audio, and rendering subsystems
//! live behind it, as does the terminal host in `spindle-cli` and the
//! recording hosts used by tests.

/// One entry of the selection list offered at the end of a passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Text shown to the player.
    pub text: String,
    /// Passage to jump to when confirmed.
    pub target: String,
}

/// Callbacks the VM invokes while executing.
///
/// Calls are observed in exactly the order the VM makes them, and
/// `fatal_error` is always the last call of a `run()` that fails.
pub trait Host {
    /// Display up to six lines of pre-wrapped, newline-separated text.
    fn set_text(&mut self, text: &str);

    /// Display the named image. An empty name hides the image.
    fn set_image(&mut self, name: &str);

    /// Switch music. An empty name stops playback.
    fn set_music(&mut self, name: &str, track: i32);

    /// Show the selection UI. An empty list hides it.
    fn set_selections(&mut self, selections: &[Selection]);

    /// Terminate the program cleanly with the message.
    fn fatal_error(&mut self, message: &str);
}
