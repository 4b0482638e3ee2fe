//! Raw 4-channel gesture samples and the per-sample direction vote.

/// One photodiode channel of the gesture sensor, in register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Up,
    Down,
    Left,
    Right,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Up, Channel::Down, Channel::Left, Channel::Right];
}

/// One sample quad pulled from the hardware FIFO. Immutable once captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
}

impl Sample {
    pub fn new(up: u8, down: u8, left: u8, right: u8) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }

    fn channel_value(&self, ch: Channel) -> u8 {
        match ch {
            Channel::Up => self.up,
            Channel::Down => self.down,
            Channel::Left => self.left,
            Channel::Right => self.right,
        }
    }

    /// The channel holding the minimum intensity.
    ///
    /// Lower raw intensity on a photodiode pair means the hand sits nearer
    /// that edge of the sensor, so the minimum channel is the direction vote.
    /// Ties resolve to the first channel in register order (all-equal → Up),
    /// which keeps the vote stable and reproducible.
    pub fn dominant_channel(&self) -> Channel {
        let mut min_ch = Channel::Up;
        let mut min_val = u8::MAX;
        for ch in Channel::ALL {
            let value = self.channel_value(ch);
            if value < min_val {
                min_val = value;
                min_ch = ch;
            }
        }
        min_ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_minimum_channel() {
        let s = Sample::new(50, 60, 70, 10);
        assert_eq!(s.dominant_channel(), Channel::Right);

        let s = Sample::new(80, 5, 70, 10);
        assert_eq!(s.dominant_channel(), Channel::Down);
    }

    #[test]
    fn tie_breaks_to_first_channel_in_register_order() {
        // all equal → Up, deterministically
        let s = Sample::new(42, 42, 42, 42);
        assert_eq!(s.dominant_channel(), Channel::Up);

        // two-way tie Down/Left → Down (earlier in register order)
        let s = Sample::new(90, 7, 7, 80);
        assert_eq!(s.dominant_channel(), Channel::Down);
    }

    #[test]
    fn saturated_sample_still_votes() {
        // every channel at full scale must not panic and must vote Up
        let s = Sample::new(255, 255, 255, 255);
        assert_eq!(s.dominant_channel(), Channel::Up);
    }
}
