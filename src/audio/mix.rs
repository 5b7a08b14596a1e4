//! Sample-level mixing: per-sample summation across contributors, divided by
//! the contributor count. Averaging keeps amplitude bounded as the room grows
//! while preserving loudness for any fixed participant count.
//!
//! The accumulator is pure arithmetic over fixed-length i16 frames; all codec
//! and channel plumbing lives in [`crate::room::mixer`].

/// i32 accumulator over equal-length i16 frames.
pub struct MixAccumulator {
    acc: Vec<i32>,
    contributors: usize,
}

impl MixAccumulator {
    pub fn new(frame_len: usize) -> Self {
        Self {
            acc: vec![0; frame_len],
            contributors: 0,
        }
    }

    pub fn reset(&mut self) {
        self.acc.fill(0);
        self.contributors = 0;
    }

    pub fn contributors(&self) -> usize {
        self.contributors
    }

    /// Add one contributor's frame. The frame must match the configured
    /// length; the caller enforces that before mixing.
    pub fn add(&mut self, frame: &[i16]) {
        debug_assert_eq!(frame.len(), self.acc.len());
        for (slot, &s) in self.acc.iter_mut().zip(frame) {
            *slot += s as i32;
        }
        self.contributors += 1;
    }

    /// Render the mean of all contributors minus `own` (the recipient's own
    /// frame, when they contributed this tick) into `out`.
    ///
    /// Returns the number of frames that went into the rendered mix; `0`
    /// means the recipient has nothing to hear this tick and no packet
    /// should be produced for them.
    pub fn render_excluding(&self, own: Option<&[i16]>, out: &mut [i16]) -> usize {
        if self.contributors == 0 {
            return 0;
        }
        let n = self.contributors - own.is_some() as usize;
        if n == 0 {
            return 0;
        }
        debug_assert_eq!(out.len(), self.acc.len());
        let divisor = n as i32;
        for (i, slot) in out.iter_mut().enumerate() {
            let mut sum = self.acc[i];
            if let Some(own) = own {
                sum -= own[i] as i32;
            }
            *slot = (sum / divisor).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_three_contributors() {
        let mut acc = MixAccumulator::new(4);
        acc.add(&[30, -30, 300, 0]);
        acc.add(&[60, -60, 600, 0]);
        acc.add(&[90, -90, 900, 3]);

        let mut out = [0i16; 4];
        assert_eq!(acc.render_excluding(None, &mut out), 3);
        assert_eq!(out, [60, -60, 600, 1]);
    }

    #[test]
    fn excludes_own_contribution() {
        let mut acc = MixAccumulator::new(2);
        let own = [100i16, 100];
        acc.add(&own);
        acc.add(&[200, -200]);
        acc.add(&[400, -400]);

        let mut out = [0i16; 2];
        assert_eq!(acc.render_excluding(Some(&own), &mut out), 2);
        assert_eq!(out, [300, -300]);
    }

    #[test]
    fn sole_contributor_hears_nothing() {
        let mut acc = MixAccumulator::new(2);
        let own = [5i16, 5];
        acc.add(&own);

        let mut out = [0i16; 2];
        assert_eq!(acc.render_excluding(Some(&own), &mut out), 0);
    }

    #[test]
    fn empty_accumulator_renders_nothing() {
        let acc = MixAccumulator::new(2);
        let mut out = [0i16; 2];
        assert_eq!(acc.render_excluding(None, &mut out), 0);
        // Excluding a frame from an empty accumulator must not underflow.
        let own = [1i16, 2];
        assert_eq!(acc.render_excluding(Some(&own), &mut out), 0);
    }

    #[test]
    fn reset_clears_state() {
        let mut acc = MixAccumulator::new(1);
        acc.add(&[10]);
        acc.reset();
        assert_eq!(acc.contributors(), 0);
        let mut out = [7i16];
        assert_eq!(acc.render_excluding(None, &mut out), 0);
        assert_eq!(out, [7]);
    }

    #[test]
    fn sums_saturate_at_i16_bounds() {
        // The raw sum exceeds i16 range; the rendered mean must not.
        let mut acc = MixAccumulator::new(1);
        acc.add(&[i16::MAX]);
        acc.add(&[i16::MAX]);
        acc.add(&[i16::MIN]);

        let own = [i16::MIN];
        let mut out = [0i16];
        assert_eq!(acc.render_excluding(Some(&own), &mut out), 2);
        assert_eq!(out, [i16::MAX]);
    }
}
