use crate::{SwipeState, MAX_SLIDER_PADS};

/// Extent of the touched region of a slider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// Lowest touched pad
    pub first: usize,
    /// Highest touched pad
    pub last: usize,
    /// Number of touched pads, which may be less than `last - first + 1`
    pub count: usize,
}

pub fn touched_span(touched: &[bool]) -> Option<Span> {
    let mut span: Option<Span> = None;
    for (i, _) in touched.iter().enumerate().filter(|(_, t)| **t) {
        span = Some(match span {
            None => Span { first: i, last: i, count: 1 },
            Some(s) => Span { last: i, count: s.count + 1, ..s },
        });
    }
    span
}

/// Fill the per-pad displacement of a slider and return the position
///
/// The touched region counts as zero; untouched pads below it count -1 and
/// pads above it count +1. The sum moves monotonically as the touched region
/// slides along the pads, whatever its width. With only pad `k` of `n`
/// touched, the position is `n - 1 - 2k`.
pub fn encode(span: Option<Span>, values: &mut [i8]) -> i16 {
    let span = match span {
        Some(span) => span,
        None => {
            values.fill(0);
            return 0;
        }
    };

    let mut position: i16 = 0;
    for (i, value) in values.iter_mut().enumerate() {
        *value = if i < span.first {
            -1
        } else if i > span.last {
            1
        } else {
            0
        };
        position += *value as i16;
    }
    position
}

/// What a single poll cycle did to the slider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearSample {
    pub swipe: SwipeState,
    /// This cycle was the first touch after a release
    pub first_touch: bool,
    /// This cycle released the slider after a touch
    pub released: bool,
    pub fine_up: bool,
    pub fine_down: bool,
}

/// Swipe detection over the touched pads of a linear slider
///
/// Pad 0 is the bottom of the slider and pad `len - 1` the top.
pub struct LinearSlider {
    len: usize,
    values: [i8; MAX_SLIDER_PADS],
    position: i16,
    previous_position: i16,
    state: SwipeState,
    swipe_up: i8,
    swipe_down: i8,
    fine_up: i8,
    fine_down: i8,
    first_touch_pending: bool,
    first_pad_top: bool,
    first_pad_bottom: bool,
}

impl LinearSlider {
    pub fn new(len: usize) -> Self {
        Self {
            len: len.min(MAX_SLIDER_PADS),
            values: [0; MAX_SLIDER_PADS],
            position: 0,
            previous_position: 0,
            state: SwipeState::NoChange,
            swipe_up: 0,
            swipe_down: 0,
            fine_up: 0,
            fine_down: 0,
            first_touch_pending: true,
            first_pad_top: false,
            first_pad_bottom: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> i16 {
        self.position
    }

    pub fn previous_position(&self) -> i16 {
        self.previous_position
    }

    pub fn values(&self) -> &[i8] {
        &self.values[..self.len]
    }

    pub fn state(&self) -> SwipeState {
        self.state
    }

    pub fn first_pad_top(&self) -> bool {
        self.first_pad_top
    }

    pub fn first_pad_bottom(&self) -> bool {
        self.first_pad_bottom
    }

    /// Input the touch decisions of one poll cycle, ordered bottom to top
    ///
    /// `fine` enables counting of fine swipes on release. The end-pad flags
    /// are tracked regardless.
    pub fn push(&mut self, touched: &[bool], fine: bool) -> LinearSample {
        let touched = &touched[..self.len.min(touched.len())];
        let span = touched_span(touched);
        let first_touch = self.first_touch_pending && span.is_some();
        let released = span.is_none() && !self.first_touch_pending;

        self.previous_position = self.position;
        self.position = encode(span, &mut self.values[..self.len]);

        let mut sample = LinearSample {
            swipe: SwipeState::NoChange,
            first_touch,
            released,
            fine_up: false,
            fine_down: false,
        };

        match span {
            None => {
                if fine {
                    if self.first_pad_top {
                        self.fine_up = self.fine_up.saturating_add(1);
                        sample.fine_up = true;
                    }
                    if self.first_pad_bottom {
                        self.fine_down = self.fine_down.saturating_add(1);
                        sample.fine_down = true;
                    }
                }
                self.reset_first_pads();
                self.first_touch_pending = true;
            }
            Some(span) => {
                if first_touch && span.count == 1 {
                    self.first_pad_bottom = span.first == 0;
                    self.first_pad_top = span.last == self.len - 1;
                }
                if !first_touch {
                    sample.swipe = match self.position.cmp(&self.previous_position) {
                        core::cmp::Ordering::Greater => {
                            self.swipe_down = self.swipe_down.saturating_add(1);
                            SwipeState::SwipeDown
                        }
                        core::cmp::Ordering::Less => {
                            self.swipe_up = self.swipe_up.saturating_add(1);
                            SwipeState::SwipeUp
                        }
                        core::cmp::Ordering::Equal => SwipeState::NoChange,
                    };
                    if sample.swipe != SwipeState::NoChange {
                        // A sliding contact is not a fine swipe
                        self.reset_first_pads();
                    }
                }
                self.first_touch_pending = false;
            }
        }

        self.state = sample.swipe;
        sample
    }

    /// Swipes down minus swipes up since the last call. Resets both counts.
    pub fn take_swipe(&mut self) -> i8 {
        let status = self.swipe_down - self.swipe_up;
        self.swipe_up = 0;
        self.swipe_down = 0;
        status
    }

    /// Fine swipes down minus fine swipes up since the last call. Resets both
    /// counts.
    pub fn take_swipe_fine(&mut self) -> i8 {
        let status = self.fine_down - self.fine_up;
        self.fine_up = 0;
        self.fine_down = 0;
        status
    }

    fn reset_first_pads(&mut self) {
        self.first_pad_top = false;
        self.first_pad_bottom = false;
    }
}
