// THEORY:
// The six tunable HSV bounds are the only state that survives from one frame
// to the next. A UI (trackbars, a config file, a test) writes them at any time;
// the capture loop reads one consistent snapshot at the start of every tick.
//
// `RangeHandle` is the writer side and `RangeView` the reader side of a
// `tokio::sync::watch` channel. The value is `Copy`, so the pipeline never
// holds a lock while it works on a frame. Bounds are clamped to the slider
// domain, but MIN <= MAX is deliberately not enforced: an inverted pair simply
// produces an empty mask for that channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// The upper end of every slider. Bytes never exceed 255, so 256 admits all.
pub const SLIDER_MAX: u16 = 256;

/// Identifies one of the six tunable bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeBound {
    HueMin,
    HueMax,
    SaturationMin,
    SaturationMax,
    ValueMin,
    ValueMax,
}

impl RangeBound {
    pub const ALL: [RangeBound; 6] = [
        RangeBound::HueMin,
        RangeBound::HueMax,
        RangeBound::SaturationMin,
        RangeBound::SaturationMax,
        RangeBound::ValueMin,
        RangeBound::ValueMax,
    ];

    /// The label shown next to the slider.
    pub fn name(self) -> &'static str {
        match self {
            RangeBound::HueMin => "H_MIN",
            RangeBound::HueMax => "H_MAX",
            RangeBound::SaturationMin => "S_MIN",
            RangeBound::SaturationMax => "S_MAX",
            RangeBound::ValueMin => "V_MIN",
            RangeBound::ValueMax => "V_MAX",
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive per-channel bounds for the colour filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub h_min: u16,
    pub h_max: u16,
    pub s_min: u16,
    pub s_max: u16,
    pub v_min: u16,
    pub v_max: u16,
}

impl Default for HsvRange {
    /// Everything passes; this is where the sliders start.
    fn default() -> Self {
        Self::new([0, 0, 0], [SLIDER_MAX; 3])
    }
}

impl HsvRange {
    /// Builds a range from `[h, s, v]` lower and upper bounds, clamping each to the slider domain.
    pub fn new(min: [u16; 3], max: [u16; 3]) -> Self {
        Self {
            h_min: min[0].min(SLIDER_MAX),
            h_max: max[0].min(SLIDER_MAX),
            s_min: min[1].min(SLIDER_MAX),
            s_max: max[1].min(SLIDER_MAX),
            v_min: min[2].min(SLIDER_MAX),
            v_max: max[2].min(SLIDER_MAX),
        }
    }

    pub fn get(&self, bound: RangeBound) -> u16 {
        match bound {
            RangeBound::HueMin => self.h_min,
            RangeBound::HueMax => self.h_max,
            RangeBound::SaturationMin => self.s_min,
            RangeBound::SaturationMax => self.s_max,
            RangeBound::ValueMin => self.v_min,
            RangeBound::ValueMax => self.v_max,
        }
    }

    /// Sets one bound, clamped to `[0, SLIDER_MAX]`. Returns the stored value.
    pub fn set(&mut self, bound: RangeBound, value: i32) -> u16 {
        let value = value.clamp(0, SLIDER_MAX as i32) as u16;
        let slot = match bound {
            RangeBound::HueMin => &mut self.h_min,
            RangeBound::HueMax => &mut self.h_max,
            RangeBound::SaturationMin => &mut self.s_min,
            RangeBound::SaturationMax => &mut self.s_max,
            RangeBound::ValueMin => &mut self.v_min,
            RangeBound::ValueMax => &mut self.v_max,
        };
        *slot = value;
        value
    }

    pub fn lower(&self) -> [u16; 3] {
        [self.h_min, self.s_min, self.v_min]
    }

    pub fn upper(&self) -> [u16; 3] {
        [self.h_max, self.s_max, self.v_max]
    }

    /// True iff every channel lies within its inclusive `[min, max]`.
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        let [h, s, v] = hsv.map(u16::from);
        self.h_min <= h
            && h <= self.h_max
            && self.s_min <= s
            && s <= self.s_max
            && self.v_min <= v
            && v <= self.v_max
    }

    /// True when some channel has MIN > MAX and the filter can never match.
    pub fn is_inverted(&self) -> bool {
        self.h_min > self.h_max || self.s_min > self.s_max || self.v_min > self.v_max
    }
}

/// Writer side of the shared range, held by whatever UI tunes the filter.
#[derive(Clone)]
pub struct RangeHandle {
    sender: Arc<watch::Sender<HsvRange>>,
}

/// Reader side of the shared range, held by the capture loop.
#[derive(Clone)]
pub struct RangeView {
    receiver: watch::Receiver<HsvRange>,
}

impl RangeHandle {
    pub fn new(initial: HsvRange) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a reader that observes every future write.
    pub fn view(&self) -> RangeView {
        RangeView {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn set(&self, bound: RangeBound, value: i32) {
        self.sender.send_modify(|range| {
            let stored = range.set(bound, value);
            log::debug!("{bound} -> {stored}");
        });
    }

    pub fn replace(&self, range: HsvRange) {
        self.sender.send_replace(range);
    }

    pub fn current(&self) -> HsvRange {
        *self.sender.borrow()
    }
}

impl RangeView {
    /// The range to use for the current frame.
    pub fn snapshot(&mut self) -> HsvRange {
        *self.receiver.borrow_and_update()
    }

    /// A view that never changes, for callers without a UI.
    pub fn fixed(range: HsvRange) -> Self {
        RangeHandle::new(range).view()
    }
}
