//! Platform-specific shortcut prompts

use crate::domain::Platform;

/// A canned prompt sent exactly like typed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub label: &'static str,
    pub prompt: &'static str,
}

const BRAINSTORM: Preset = Preset {
    label: "Brainstorm Ideas",
    prompt: "Give me 3 distinct execution angles for this theme.",
};

const YOUTUBE: [Preset; 4] = [
    BRAINSTORM,
    Preset {
        label: "Outline Script",
        prompt: "Write a detailed script outline with timestamps.",
    },
    Preset {
        label: "Thumbnail Ideas",
        prompt: "Describe 3 clickable thumbnail concepts with text overlays.",
    },
    Preset {
        label: "Title Options",
        prompt: "Give me 5 SEO-friendly viral titles.",
    },
];

const INSTAGRAM: [Preset; 4] = [
    BRAINSTORM,
    Preset {
        label: "Reel Script",
        prompt: "Write a 30-second Reel script with visual cues and audio suggestions.",
    },
    Preset {
        label: "Caption & Hashtags",
        prompt: "Write an engaging caption with a hook and relevant hashtags.",
    },
    Preset {
        label: "Story Sequence",
        prompt: "Plan a 3-slide Story sequence to promote this.",
    },
];

/// Presets offered for `platform`, in display order
pub fn presets_for(platform: Platform) -> &'static [Preset] {
    match platform {
        Platform::YouTube => &YOUTUBE,
        Platform::Instagram => &INSTAGRAM,
    }
}

/// Look up a preset by 1-based position or case-insensitive label
pub fn find_preset(platform: Platform, selector: &str) -> Option<Preset> {
    let presets = presets_for(platform);
    let selector = selector.trim();
    if let Ok(n) = selector.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| presets.get(i)).copied();
    }
    presets.iter().find(|p| p.label.eq_ignore_ascii_case(selector)).copied()
}
