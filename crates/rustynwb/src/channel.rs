//! Acquisition channel descriptions.

/// One recorded electrode channel.
///
/// `group_index` is the position of the channel's group among all recorded
/// groups, `local_index` its position within the group and `global_index`
/// its row in the electrodes table.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub group_name: String,
    pub group_index: usize,
    pub local_index: usize,
    pub global_index: usize,
    /// Factor from raw units to microvolts.
    pub conversion: f32,
    /// Samples per second.
    pub sampling_rate: f32,
    /// Microvolts per raw bit.
    pub bit_volts: f32,
    pub position: [f32; 3],
    pub comments: String,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        group_name: impl Into<String>,
        group_index: usize,
        local_index: usize,
        global_index: usize,
    ) -> Self {
        Self {
            name: name.into(),
            group_name: group_name.into(),
            group_index,
            local_index,
            global_index,
            conversion: 1e6,
            sampling_rate: 30000.0,
            bit_volts: 0.05,
            position: [0.0; 3],
            comments: "no comments".to_string(),
        }
    }

    pub fn with_sampling_rate(mut self, sampling_rate: f32) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    pub fn with_bit_volts(mut self, bit_volts: f32) -> Self {
        self.bit_volts = bit_volts;
        self
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// Factor from stored values to volts.
    pub fn conversion(&self) -> f32 {
        self.bit_volts / self.conversion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ch = Channel::new("ch0", "array0", 0, 0, 0);
        assert_eq!(ch.sampling_rate, 30000.0);
        assert_eq!(ch.comments, "no comments");
        assert!((ch.conversion() - 0.05e-6).abs() < 1e-12);
    }

    #[test]
    fn builders() {
        let ch = Channel::new("ch1", "array0", 0, 1, 1)
            .with_bit_volts(0.195)
            .with_sampling_rate(20000.0)
            .with_position([1.0, 2.0, 3.0]);
        assert_eq!(ch.position, [1.0, 2.0, 3.0]);
        assert_eq!(ch.sampling_rate, 20000.0);
        assert!((ch.conversion() - 0.195e-6).abs() < 1e-12);
    }
}
