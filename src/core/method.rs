//! Shredding methods, their pass sequences and the byte patterns each pass writes.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Number of passes used when the user does not pick one.
pub const DEFAULT_BASIC_PASSES: u32 = 3;

const DOD_SEQUENCE: [PassPattern; 7] = [
    PassPattern::AllOnes,
    PassPattern::AllZeros,
    PassPattern::RandomBytes,
    PassPattern::AllZeros,
    PassPattern::AllOnes,
    PassPattern::RandomBytes,
    PassPattern::AllZeros,
];

const BASIC_DESCRIPTION: &str = "Basic multi-pass overwrite.\n\
Pass 1 writes 0xFF over every byte.\n\
Pass 2 writes 0x00 over every byte.\n\
Every further pass writes fresh random data.\n\
The pass count is configurable (at least 1).";

const DOD_DESCRIPTION: &str = "DoD 5220.22-M style 7-pass overwrite.\n\
Pass 1: 0xFF\n\
Pass 2: 0x00\n\
Pass 3: random data\n\
Pass 4: 0x00\n\
Pass 5: 0xFF\n\
Pass 6: random data\n\
Pass 7: 0x00\n\
The pass count is fixed and ignores any configured value.";

/// The byte pattern written during a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPattern {
    AllOnes,
    AllZeros,
    RandomBytes,
}

impl PassPattern {
    /// The constant every byte must equal, or `None` for random passes.
    pub fn expected_byte(self) -> Option<u8> {
        match self {
            PassPattern::AllOnes => Some(0xFF),
            PassPattern::AllZeros => Some(0x00),
            PassPattern::RandomBytes => None,
        }
    }

    pub fn is_deterministic(self) -> bool {
        self.expected_byte().is_some()
    }
}

impl fmt::Display for PassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PassPattern::AllOnes => "ones",
            PassPattern::AllZeros => "zeros",
            PassPattern::RandomBytes => "random",
        };
        f.write_str(label)
    }
}

/// One full overwrite of a file. `index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub index: u32,
    pub total: u32,
    pub pattern: PassPattern,
}

/// How a file is overwritten before it is unlinked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShredMethod {
    /// Ones, zeros, then random data for every remaining pass.
    Basic { passes: NonZeroU32 },
    /// Fixed seven-pass sequence.
    #[serde(rename = "dod_5220_22_m")]
    Dod5220_22M,
}

impl Default for ShredMethod {
    fn default() -> Self {
        ShredMethod::basic(DEFAULT_BASIC_PASSES)
    }
}

impl ShredMethod {
    /// Builds a `Basic` method. A requested count of zero becomes one pass.
    pub fn basic(passes: u32) -> Self {
        ShredMethod::Basic {
            passes: NonZeroU32::new(passes).unwrap_or(NonZeroU32::MIN),
        }
    }

    /// Every method a front end can offer, with `Basic` at its default count.
    pub fn all() -> [ShredMethod; 2] {
        [ShredMethod::default(), ShredMethod::Dod5220_22M]
    }

    pub fn pass_count(&self) -> u32 {
        match self {
            ShredMethod::Basic { passes } => passes.get(),
            ShredMethod::Dod5220_22M => DOD_SEQUENCE.len() as u32,
        }
    }

    /// The pattern used for the 1-based pass `index`.
    pub fn pattern_for(&self, index: u32) -> PassPattern {
        match self {
            ShredMethod::Basic { .. } => match index {
                1 => PassPattern::AllOnes,
                2 => PassPattern::AllZeros,
                _ => PassPattern::RandomBytes,
            },
            ShredMethod::Dod5220_22M => {
                let slot = (index.max(1) as usize - 1).min(DOD_SEQUENCE.len() - 1);
                DOD_SEQUENCE[slot]
            }
        }
    }

    /// The ordered passes this method performs on every file.
    pub fn pass_sequence(&self) -> Vec<Pass> {
        let total = self.pass_count();
        (1..=total)
            .map(|index| Pass {
                index,
                total,
                pattern: self.pattern_for(index),
            })
            .collect()
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            ShredMethod::Basic { .. } => "Basic (Multi-pass Random)",
            ShredMethod::Dod5220_22M => "DoD 5220.22-M (7-pass)",
        }
    }

    /// Multi-line explanation of the pass sequence, for display only.
    pub fn description(&self) -> &'static str {
        match self {
            ShredMethod::Basic { .. } => BASIC_DESCRIPTION,
            ShredMethod::Dod5220_22M => DOD_DESCRIPTION,
        }
    }
}

impl fmt::Display for ShredMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShredMethod::Basic { passes } => write!(f, "Basic ({}-pass)", passes),
            ShredMethod::Dod5220_22M => f.write_str(self.name()),
        }
    }
}

/// Fills write buffers with the bytes a pass prescribes.
///
/// Random passes draw fresh bytes for every chunk. A random chunk never comes
/// out uniformly 0x00 or 0xFF, so a random pass cannot be mistaken for stale
/// deterministic content.
#[derive(Debug, Default)]
pub struct PatternGenerator;

impl PatternGenerator {
    pub fn fill(&self, pattern: PassPattern, buf: &mut [u8]) {
        match pattern.expected_byte() {
            Some(byte) => buf.fill(byte),
            None => {
                let mut rng = rand::thread_rng();
                loop {
                    rng.fill_bytes(buf);
                    if !is_uniform(buf, 0x00) && !is_uniform(buf, 0xFF) {
                        break;
                    }
                }
            }
        }
    }
}

pub(crate) fn is_uniform(buf: &[u8], byte: u8) -> bool {
    buf.iter().all(|b| *b == byte)
}
