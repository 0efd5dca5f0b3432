//! Stereo channel addressing

use serde::{Deserialize, Serialize};

use crate::{GfeError, GfeResult};

/// One side of a stereo pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(usize)]
pub enum Channel {
    #[default]
    Left = 0,
    Right = 1,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Left, Channel::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The opposite channel
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Channel::Left => Channel::Right,
            Channel::Right => Channel::Left,
        }
    }

    pub fn from_index(index: usize) -> GfeResult<Self> {
        match index {
            0 => Ok(Channel::Left),
            1 => Ok(Channel::Right),
            _ => Err(GfeError::InvalidChannel(index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_channel() {
        assert_eq!(Channel::Left.other(), Channel::Right);
        assert_eq!(Channel::Right.other(), Channel::Left);
    }

    #[test]
    fn test_from_index() {
        assert_eq!(Channel::from_index(0), Ok(Channel::Left));
        assert_eq!(Channel::from_index(1), Ok(Channel::Right));
        assert_eq!(Channel::from_index(2), Err(GfeError::InvalidChannel(2)));
    }
}
