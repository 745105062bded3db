use rand::seq::SliceRandom;

/// Picks one canned response out of a configured list of variants.
pub trait ResponseChooser: Send + Sync {
    fn choose<'a>(&self, variants: &'a [String]) -> Option<&'a str>;
}

/// Uniform random choice; the production chooser.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomChooser;

impl ResponseChooser for RandomChooser {
    fn choose<'a>(&self, variants: &'a [String]) -> Option<&'a str> {
        variants.choose(&mut rand::thread_rng()).map(String::as_str)
    }
}

/// Always the first variant. Keeps rendered replies deterministic.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstChooser;

impl ResponseChooser for FirstChooser {
    fn choose<'a>(&self, variants: &'a [String]) -> Option<&'a str> {
        variants.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{FirstChooser, RandomChooser, ResponseChooser};

    #[test]
    fn empty_variants_yield_nothing() {
        assert_eq!(RandomChooser.choose(&[]), None);
        assert_eq!(FirstChooser.choose(&[]), None);
    }

    #[test]
    fn random_choice_comes_from_variants() {
        let variants = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        for _ in 0..32 {
            let chosen = RandomChooser.choose(&variants).expect("non-empty");
            assert!(variants.iter().any(|variant| variant == chosen));
        }
    }

    #[test]
    fn first_chooser_is_deterministic() {
        let variants = vec!["one".to_string(), "two".to_string()];
        assert_eq!(FirstChooser.choose(&variants), Some("one"));
    }
}
