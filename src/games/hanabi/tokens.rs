use anyhow::Result;

use super::error::ErrorKind;

// Shared hint tokens, spent to give hints and earned back by discarding
#[derive(Clone, Debug)]
pub struct HintTokens {
    count: usize,
    max: usize,
}

impl HintTokens {
    pub fn new(initial: usize, max: usize) -> Self {
        HintTokens { count: initial.min(max), max }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn can_add(&self) -> bool {
        self.count < self.max
    }

    pub fn add(&mut self) -> Result<()> {
        if !self.can_add() {
            return Err(ErrorKind::PoolOverflow.into());
        }
        self.count += 1;
        Ok(())
    }

    pub fn can_use(&self) -> bool {
        self.count > 0
    }

    pub fn use_token(&mut self) -> Result<()> {
        if !self.can_use() {
            return Err(ErrorKind::PoolUnderflow.into());
        }
        self.count -= 1;
        Ok(())
    }
}

// Misplays. The caller decides when to stop, the pool only counts.
#[derive(Clone, Debug)]
pub struct FailureTokens {
    count: usize,
    threshold: usize,
}

impl FailureTokens {
    pub fn new(threshold: usize) -> Self {
        FailureTokens { count: 0, threshold }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn add(&mut self) {
        self.count += 1;
    }

    pub fn is_failed(&self) -> bool {
        self.count >= self.threshold
    }
}
