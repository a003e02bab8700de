//! End-to-end redaction scenarios
//!
//! Exercises the public library API across module boundaries.

use image::{Rgb, RgbImage};
use pii_redactor::mask::threshold;
use pii_redactor::text::resolve;
use pii_redactor::text::{RawSpan, TokenClassifier, TokenTag};
use pii_redactor::{
    BlurOptions, FillStrategy, JsonSpanDetector, MaskEngine, MaskOptions, NerDetector,
    OcclusionOptions, OcclusionSearch, Region, RegionBlur, RegexDetector, SaliencyError,
    SaliencyMap, SilentProgress, TextRedactionOptions, TextRedactor,
};

#[cfg(test)]
mod tests {
    use super::*;

    const CONTACT: &str = "Contact John Smith at john@example.com or 555-123-4567";

    struct ContactNer;

    impl TokenClassifier for ContactNer {
        fn classify(&self, _text: &str) -> pii_redactor::text::Result<Vec<TokenTag>> {
            Ok(vec![
                TokenTag::new(0, 7, "O"),
                TokenTag::new(8, 12, "B-NAME"),
                TokenTag::new(13, 18, "I-NAME"),
                TokenTag::new(19, 21, "O"),
            ])
        }
    }

    fn gradient(width: u32, height: u32) -> SaliencyMap {
        SaliencyMap::from_fn(width, height, |x, y| {
            ((x * 7 + y * 13) % 97) as f32 / 97.0
        })
    }

    // TC-TXT-001: Contact line round trip through both producers
    #[test]
    fn test_contact_round_trip() {
        let regex = RegexDetector::builtin();
        let classifier = ContactNer;
        let ner = NerDetector::new("ner", &classifier);
        let redactor = TextRedactor::new(TextRedactionOptions::default())
            .with_detector(&regex)
            .with_detector(&ner);

        let result = redactor.redact(CONTACT).unwrap();
        assert_eq!(result.text, "Contact [NAME_1] at [EMAIL_1] or [PHONE_1]");
        assert!(resolve::is_disjoint(&result.spans));
    }

    // TC-TXT-002: Address fragments separated by '#' are one entity
    #[test]
    fn test_address_fragments_coalesce() {
        let model = JsonSpanDetector::new(
            "model",
            vec![
                RawSpan::new(0, 4, "ADDRESS"),
                RawSpan::new(5, 9, "ADDRESS"),
            ],
        );
        let redactor = TextRedactor::new(TextRedactionOptions::default()).with_detector(&model);

        let result = redactor.redact("Unit#Apt9 is upstairs").unwrap();
        assert_eq!(result.text, "[ADDRESS_1] is upstairs");
        assert_eq!((result.spans[0].start, result.spans[0].end), (0, 9));
    }

    // TC-TXT-003: Resolving an already resolved span list changes nothing
    #[test]
    fn test_resolution_idempotent() {
        let regex = RegexDetector::builtin();
        let classifier = ContactNer;
        let ner = NerDetector::new("ner", &classifier);
        let redactor = TextRedactor::new(TextRedactionOptions::default())
            .with_detector(&regex)
            .with_detector(&ner);

        let chars: Vec<char> = CONTACT.chars().collect();
        let first = redactor.redact(CONTACT).unwrap().spans;
        let second = redactor.resolve(first.clone(), &chars).unwrap();
        assert_eq!(first, second);
    }

    // TC-MSK-001: An all-zero heatmap never produces a mask
    #[test]
    fn test_zero_map_empty_for_every_fraction() {
        let map = SaliencyMap::zeros(50, 40);
        for p in [0.01, 0.2, 0.5, 1.0] {
            let options = MaskOptions::builder().top_fraction(p).build();
            let result = MaskEngine::extract(&map, &options).unwrap();
            assert!(result.is_empty());
            assert_eq!(result.coverage, 0.0);
        }
    }

    // TC-MSK-002: A single hot block becomes exactly one rectangle
    #[test]
    fn test_single_block_single_rectangle() {
        let map = SaliencyMap::from_fn(100, 100, |x, y| {
            if (40..50).contains(&x) && (40..50).contains(&y) {
                1.0
            } else {
                0.0
            }
        });
        let options = MaskOptions::builder().top_fraction(0.01).dilate(0).build();

        let result = MaskEngine::extract(&map, &options).unwrap();
        assert_eq!(result.regions, vec![Region::new(40, 40, 10, 10)]);
        assert_eq!(result.coverage, 0.01);
    }

    // TC-MSK-003: A larger fraction never masks fewer pixels
    #[test]
    fn test_mask_monotonic_in_fraction() {
        let map = gradient(64, 48);
        let mut previous = 0;
        for p in [0.05, 0.1, 0.3, 0.6, 1.0] {
            let mask = threshold::threshold_top_fraction(&map, p).unwrap();
            let on = threshold::count_on(&mask);
            assert!(on >= previous, "p={} masked {} < {}", p, on, previous);
            previous = on;
        }
    }

    // TC-BLR-001: Blurring outside the image is a no-op
    #[test]
    fn test_blur_outside_image_noop() {
        let mut image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 0]));
        let original = image.clone();

        let applied = RegionBlur::apply_all(
            &mut image,
            &[Region::new(40, 40, 10, 10), Region::new(5, 5, 0, 8)],
            &BlurOptions::gaussian(9),
        );
        assert_eq!(applied, 0);
        assert_eq!(image, original);
    }

    // TC-SAL-001: Occlusion search feeds the mask engine
    #[test]
    fn test_occlusion_to_mask() {
        let mut image = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        for y in 8..24 {
            for x in 40..56 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }

        let brightness = |img: &RgbImage| -> Result<f32, SaliencyError> {
            Ok(img.as_raw().iter().map(|&v| v as f32).sum::<f32>() / 1000.0)
        };
        let options = OcclusionOptions::builder()
            .window(16)
            .stride(8)
            .fill(FillStrategy::Gray)
            .build();
        let map = OcclusionSearch::saliency(&image, &brightness, &options, &SilentProgress).unwrap();

        let mask_options = MaskOptions::builder().top_fraction(0.05).dilate(3).build();
        let result = MaskEngine::extract(&map, &mask_options).unwrap();
        assert!(!result.is_empty());
        assert!(result.regions.iter().any(|r| r.contains(46, 14)));
        assert!(result.regions.iter().all(|r| !r.contains(4, 60)));
    }
}
