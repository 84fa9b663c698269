use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::clock::TickSource;

const KEY_1990: &str = "Copyright (c) 1990, Gray Design Associates";
const KEY_1991: &str = "Copyright 1991, Gray Design Associates";
const KEY_1992: &str = "Copyright 1992, Gray Design Associates";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GameRelease {
    #[value(name = "h1d", alias = "hugo1_dos")]
    Hugo1Dos,
    #[value(name = "h2d", alias = "hugo2_dos")]
    Hugo2Dos,
    #[value(name = "h3d", alias = "hugo3_dos")]
    Hugo3Dos,
    #[value(name = "h1w", alias = "hugo1_win")]
    Hugo1Win,
    #[value(name = "h2w", alias = "hugo2_win")]
    Hugo2Win,
    #[value(name = "h3w", alias = "hugo3_win")]
    Hugo3Win,
}

impl GameRelease {
    pub fn short_name(self) -> &'static str {
        match self {
            GameRelease::Hugo1Dos => "h1d",
            GameRelease::Hugo2Dos => "h2d",
            GameRelease::Hugo3Dos => "h3d",
            GameRelease::Hugo1Win => "h1w",
            GameRelease::Hugo2Win => "h2w",
            GameRelease::Hugo3Win => "h3w",
        }
    }

    /// Index of this release's section in the script resource.
    pub fn variant(self) -> usize {
        match self {
            GameRelease::Hugo1Win => 0,
            GameRelease::Hugo2Win => 1,
            GameRelease::Hugo3Win => 2,
            GameRelease::Hugo1Dos => 3,
            GameRelease::Hugo2Dos => 4,
            GameRelease::Hugo3Dos => 5,
        }
    }

    pub fn is_dos(self) -> bool {
        matches!(
            self,
            GameRelease::Hugo1Dos | GameRelease::Hugo2Dos | GameRelease::Hugo3Dos
        )
    }

    pub fn profile(self) -> ReleaseProfile {
        let (cipher, prompt_match) = match self {
            GameRelease::Hugo1Dos => (
                TextCipher::Additive { key: KEY_1990 },
                PromptMatch::FirstResponse,
            ),
            GameRelease::Hugo2Dos => (
                TextCipher::Subtractive { key: KEY_1991 },
                PromptMatch::AnyResponse,
            ),
            _ => (
                TextCipher::Subtractive { key: KEY_1992 },
                PromptMatch::AnyResponse,
            ),
        };
        let (tick_source, ticks_per_second) = if self.is_dos() {
            (TickSource::Dos, 9)
        } else {
            (TickSource::Frame, 18)
        };
        ReleaseProfile {
            release: self,
            tick_source,
            ticks_per_second,
            cipher,
            prompt_match,
        }
    }
}

impl fmt::Display for GameRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Cipher applied to encoded prompt answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCipher {
    /// `(c + key[i]) mod '~'`, pushed back into the printable range.
    Additive { key: &'static str },
    /// `c - key[i mod len]`, wrapping.
    Subtractive { key: &'static str },
}

impl TextCipher {
    pub fn key(&self) -> &'static str {
        match *self {
            TextCipher::Additive { key } | TextCipher::Subtractive { key } => key,
        }
    }

    pub fn decode(&self, line: &[u8]) -> Vec<u8> {
        let key = self.key().as_bytes();
        if key.is_empty() {
            return line.to_vec();
        }
        let decoded: Vec<u8> = line
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let k = key[i % key.len()];
                match self {
                    TextCipher::Additive { .. } => {
                        let mut out = ((u32::from(c) + u32::from(k)) % u32::from(b'~')) as u8;
                        if out < b' ' {
                            out += b' ';
                        }
                        out
                    }
                    TextCipher::Subtractive { .. } => c.wrapping_sub(k),
                }
            })
            .collect();
        log::debug!(
            "decoded prompt answer {:?} -> {:?}",
            String::from_utf8_lossy(line),
            String::from_utf8_lossy(&decoded)
        );
        decoded
    }
}

/// How a typed answer is matched against a prompt's accepted responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMatch {
    FirstResponse,
    AnyResponse,
}

/// Per-release behaviour chosen once when the scheduler is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseProfile {
    pub release: GameRelease,
    pub tick_source: TickSource,
    pub ticks_per_second: u32,
    pub cipher: TextCipher,
    pub prompt_match: PromptMatch,
}
