//! Built-in categories.
//!
//! Prompt wording is tuned against CLIP ViT-B/32. Clothing prompts are on
//! their eighth revision; the scarf is what separates winter from spring.

use super::{Category, Group};

pub(super) fn categories() -> Vec<Category> {
    vec![
        watermark(),
        clothing_season(),
        scenery_season(),
        blur(),
        scene_type(),
    ]
}

fn watermark() -> Category {
    Category::new(
        "watermark",
        vec![
            Group::new(
                "watermark",
                [
                    "a photo with visible watermark or logo overlay",
                    "a photo with semi-transparent text or logo watermark",
                    "a photo with faint watermark in the corner",
                ],
            ),
            Group::new("clean", ["a clean photo without any watermark"]),
        ],
        vec![],
    )
}

fn clothing_season() -> Category {
    Category::new(
        "clothing-season",
        vec![
            Group::new(
                "winter",
                ["person wearing winter clothing with scarf around neck, thick padded coat, down jacket, hooded parka, or heavy winter outerwear"],
            ),
            Group::new(
                "autumn",
                ["person wearing layered autumn outfit with wool sweater under medium coat or cardigan, no scarf, in cool fall weather"],
            ),
            Group::new(
                "summer",
                ["person wearing minimal summer clothes with short sleeves, bare arms, tank top or thin t-shirt in hot sunny weather"],
            ),
            Group::new(
                "spring",
                ["person wearing thin unpadded spring jacket or light windbreaker with no scarf and no thick padding"],
            ),
        ],
        vec![
            Group::new("no person", ["no person in the image"]),
            // Uniforms say nothing about the season.
            Group::new(
                "uniform",
                ["person wearing work uniform, professional attire, staff clothing, or employee outfit"],
            ),
        ],
    )
}

fn scenery_season() -> Category {
    Category::new(
        "scenery-season",
        vec![
            Group::new(
                "winter",
                ["winter scenery with bare leafless trees, snow, frost, dry branches or cold weather"],
            ),
            Group::new(
                "autumn",
                ["autumn scenery with golden yellow and orange leaves falling from trees"],
            ),
            Group::new(
                "summer",
                ["summer scenery with dense green foliage, bright sunshine and blue sky"],
            ),
            Group::new(
                "spring",
                ["spring scenery with cherry blossoms, colorful flowers blooming, and fresh green leaves"],
            ),
        ],
        vec![
            Group::new(
                "evergreen",
                ["evergreen plants like holly, boxwood, pine, cypress, indoor potted plants, or artificial decorative plants that stay green year-round regardless of season"],
            ),
            Group::new("indoor", ["indoor scene or no natural scenery visible"]),
        ],
    )
}

fn blur() -> Category {
    Category::new(
        "blur",
        vec![
            Group::new("blurry", ["a blurry, out of focus, or motion blurred photo"]),
            Group::new("sharp", ["a sharp, clear, and in-focus photo"]),
        ],
        vec![],
    )
}

fn scene_type() -> Category {
    Category::new(
        "scene-type",
        vec![
            Group::new(
                "shop",
                ["indoor shop, store, pharmacy, supermarket, or retail space with product shelves and merchandise"],
            ),
            Group::new(
                "street",
                ["urban city street scene with buildings, roads, sidewalks, and no trees or plants visible"],
            ),
            Group::new(
                "nature",
                ["outdoor natural scene with trees, plants, grass, flowers, or green vegetation"],
            ),
            Group::new("other", ["other scene or mixed environment"]),
        ],
        vec![],
    )
}
