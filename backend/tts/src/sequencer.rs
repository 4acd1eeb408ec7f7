//! Audio playback sequencer.
//!
//! At most one clip renders at a time; everything else waits in a strict
//! FIFO queue. The sequencer never renders audio itself (an [`AudioSink`]
//! does) and it advances only when told the current clip finished
//! (`on_playback_complete`) or was skipped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::synth::AudioClip;

/// Rendering seam. `play` returns once rendering has been dispatched, not
/// once it completes; completion is reported back through
/// [`Sequencer::on_playback_complete`].
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, clip: &AudioClip) -> Result<()>;

    /// Stop rendering the current clip immediately.
    async fn stop(&self) -> Result<()>;
}

#[derive(Default)]
struct State {
    current: Option<AudioClip>,
    queue: VecDeque<AudioClip>,
}

pub struct Sequencer {
    sink: Arc<dyn AudioSink>,
    state: Mutex<State>,
}

impl Sequencer {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self { sink, state: Mutex::new(State::default()) }
    }

    /// Play immediately when idle (the queue is bypassed entirely);
    /// otherwise append in arrival order.
    pub async fn enqueue_or_play(&self, clip: AudioClip) -> Result<()> {
        let play_now = {
            let mut state = self.state.lock().unwrap();
            if state.current.is_some() {
                debug!("[Sequencer] Queued clip {} ({} pending)", clip.id, state.queue.len() + 1);
                state.queue.push_back(clip);
                None
            } else {
                state.current = Some(clip.clone());
                Some(clip)
            }
        };

        match play_now {
            Some(clip) => self.sink.play(&clip).await,
            None => Ok(()),
        }
    }

    /// The current clip finished rendering: advance to the queue head, or
    /// go idle.
    pub async fn on_playback_complete(&self) -> Result<()> {
        let next = {
            let mut state = self.state.lock().unwrap();
            state.current = None;
            let next = state.queue.pop_front();
            state.current = next.clone();
            next
        };

        match next {
            Some(clip) => {
                debug!("[Sequencer] Advancing to clip {}", clip.id);
                self.sink.play(&clip).await
            }
            None => Ok(()),
        }
    }

    /// Skip is a synthetic completion: stop the sink, then run the same
    /// advance transition natural completion would. Meaningless while idle.
    pub async fn skip_current(&self) -> Result<()> {
        if self.state.lock().unwrap().current.is_none() {
            return Ok(());
        }
        self.sink.stop().await?;
        self.on_playback_complete().await
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().current.is_some()
    }

    /// Number of clips waiting behind the current one.
    pub fn pending(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }
}
