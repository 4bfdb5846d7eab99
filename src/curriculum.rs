use std::ops::RangeInclusive;

use crate::models::{Lesson, Tier};

pub const BASICS_DAYS: i32 = 4;
pub const TOTAL_DAYS: i32 = 12;
pub const DEFAULT_DEADLINE_HOUR: i32 = 21;

/// Days that must all carry a submission before certification.
pub const ADVANCED_DAYS: RangeInclusive<i32> = (BASICS_DAYS + 1)..=TOTAL_DAYS;

const CATALOG: [(i32, Tier, &str, &str, &str); 12] = [
    (
        1,
        Tier::Basic,
        "Welcome to Photex Academy – Free Basics (Day 1)",
        "Media is power: stories, brands, visuals. This week is a TASTE: \
         Photography & Photoshop fundamentals. Limited lessons to warm you up.\n\n\
         When you subscribe to Advanced, you unlock:\n\
         • Videography & Cinematic Shooting\n\
         • Editing & Professional Color Grading\n\
         • Advanced Graphics & Branding\n\
         • Portrait & Product Photography\n\
         • Social Media Marketing & Business Skills\n\
         • CERTIFICATE at the end\n\n\
         Who you become: a Creative Professional able to design, shoot, edit, and market for real clients.",
        "Introduce yourself: your full name + one reason you joined.",
    ),
    (
        2,
        Tier::Basic,
        "Photoshop Basics I – Workspace & Layers (Day 2)",
        "Get comfortable: interface, tools panel, moving layers, text tool, saving files.\n\
         Tip: Name your layers. Simplicity = speed.",
        "Open an image and add your name with the Text Tool. Export and submit.",
    ),
    (
        3,
        Tier::Basic,
        "Photography Basics I – Composition (Day 3)",
        "Rule of Thirds, framing, perspective, leading lines. Light: face the light, then shape it.",
        "Capture a photo using Rule of Thirds. Submit your best shot.",
    ),
    (
        4,
        Tier::Basic,
        "Photoshop Basics II – Color & Retouch (Day 4)",
        "Exposure, white balance, curves; Spot Healing for quick cleanup. Keep skin natural.",
        "Retouch the provided sample (or your own portrait). Export and submit.",
    ),
    (
        5,
        Tier::Advanced,
        "Videography I – Cinematic Shooting",
        "Angles, camera movement (pan/tilt/dolly), storyboarding short sequences. Keep shots steady.",
        "Shoot a 15s cinematic clip using at least one movement (pan/tilt/dolly).",
    ),
    (
        6,
        Tier::Advanced,
        "Photography Advanced – Portraits & Products",
        "Lighting setups (key/fill/back), posing basics, backgrounds, reflections. Control highlights.",
        "Submit one portrait + one product photo (clean background).",
    ),
    (
        7,
        Tier::Advanced,
        "Videography II – Editing Workflow",
        "Cutting, pacing, continuity. Tell a story with 30 seconds. Music supports emotion.",
        "Edit provided raw clips (or yours) into a 30s micro-story.",
    ),
    (
        8,
        Tier::Advanced,
        "Editing & Color Grading",
        "Color correction vs grading, LUTs, matching shots. Mood through color.",
        "Apply a cinematic grade to a short clip. Export and submit.",
    ),
    (
        9,
        Tier::Advanced,
        "Photoshop Advanced – Branding & Posters",
        "Visual hierarchy, grids, typography pairing, brand consistency.",
        "Design a poster for a youth event using given assets or your own.",
    ),
    (
        10,
        Tier::Advanced,
        "Digital Marketing & Content Strategy",
        "Audience, message, format, schedule. Hooks, captions, CTAs. Measure what matters.",
        "Draft a 1-week social campaign plan for a small brand.",
    ),
    (
        11,
        Tier::Advanced,
        "3D & Product Visualization (Intro)",
        "Concepts: modeling vs mockups; product scenes with depth, shadows, realism.",
        "Create a branded mockup (template allowed) and submit your render.",
    ),
    (
        12,
        Tier::Advanced,
        "Capstone + Graduation",
        "Combine skills: shoot or source a photo → edit → design a poster → write a caption.",
        "Submit your final integrated project.",
    ),
];

/// The preloaded curriculum, ordered by day.
pub fn lessons() -> Vec<Lesson> {
    CATALOG
        .iter()
        .map(|(day, tier, title, content, assignment)| Lesson {
            day: *day,
            tier: *tier,
            title: (*title).to_string(),
            content: (*content).to_string(),
            assignment: (*assignment).to_string(),
            deadline_hour: DEFAULT_DEADLINE_HOUR,
        })
        .collect()
}

pub fn is_valid_day(day: i32) -> bool {
    (1..=TOTAL_DAYS).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_day_once() {
        let lessons = lessons();
        assert_eq!(lessons.len() as i32, TOTAL_DAYS);
        for (index, lesson) in lessons.iter().enumerate() {
            assert_eq!(lesson.day, index as i32 + 1);
        }
    }

    #[test]
    fn tiers_split_after_basics() {
        for lesson in lessons() {
            let expected = if lesson.day <= BASICS_DAYS {
                Tier::Basic
            } else {
                Tier::Advanced
            };
            assert_eq!(lesson.tier, expected, "day {}", lesson.day);
        }
    }

    #[test]
    fn advanced_range_is_five_through_twelve() {
        assert_eq!(ADVANCED_DAYS, 5..=12);
        assert!(!is_valid_day(0));
        assert!(is_valid_day(12));
        assert!(!is_valid_day(13));
    }
}
