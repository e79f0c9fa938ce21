//! 定长槽位数组
//!
//! 赛道最多 40 个计时分段；车手分段状态与会话分段旗帜都用这个定长数组。

use std::ops::{Deref, DerefMut};

use serde::{Serialize, Serializer};

pub const MAX_SEGMENTS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slots<T>(pub [T; MAX_SEGMENTS]);

impl<T: Copy> Slots<T> {
    pub fn filled(value: T) -> Self {
        Self([value; MAX_SEGMENTS])
    }
}

impl<T: Copy + Default> Default for Slots<T> {
    fn default() -> Self {
        Self::filled(T::default())
    }
}

impl<T> Deref for Slots<T> {
    type Target = [T; MAX_SEGMENTS];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Slots<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Serialize> Serialize for Slots<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}
