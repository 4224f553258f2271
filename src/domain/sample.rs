// ============================================================
// Layer 3: Sample Domain Types
// ============================================================
// A Sample is one source image in the raw bucket together with
// the integer label of the category prefix it was listed under.
//
// Raw bucket layout:
//   cats/<anything>.jpg   → label 0
//   dogs/<anything>.jpg   → label 1
//
// Sample names use the singular category and a counter that is
// shared across categories, so a run over 3 cats and 2 dogs yields
//   cat_0001, cat_0002, cat_0003, dog_0004, dog_0005

/// The image categories the pipeline knows about.
/// Declaration order is the processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Cats,
    Dogs,
}

impl Category {
    /// Every category, in processing order
    pub const ALL: [Category; 2] = [Category::Cats, Category::Dogs];

    /// The plural name, which is also the bucket prefix directory
    pub fn name(self) -> &'static str {
        match self {
            Category::Cats => "cats",
            Category::Dogs => "dogs",
        }
    }

    /// Integer class id used in every output format
    pub fn label(self) -> u8 {
        match self {
            Category::Cats => 0,
            Category::Dogs => 1,
        }
    }

    /// Object-key prefix the category's images live under
    pub fn prefix(self) -> String {
        format!("{}/", self.name())
    }

    /// "cats" → "cat"
    pub fn singular(self) -> &'static str {
        let name = self.name();
        &name[..name.len() - 1]
    }

    pub fn from_label(label: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| i64::from(c.label()) == label)
    }
}

/// One raw image scheduled for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Output name, e.g. `cat_0001`
    pub name: String,

    /// Object key in the raw bucket
    pub key: String,

    pub category: Category,
}

impl Sample {
    /// Build the sample for the `counter`-th object of the run (1-based).
    pub fn new(category: Category, key: impl Into<String>, counter: usize) -> Self {
        Self {
            name: format!("{}_{:04}", category.singular(), counter),
            key: key.into(),
            category,
        }
    }

    pub fn label(&self) -> u8 {
        self.category.label()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_category_order() {
        assert_eq!(Category::Cats.label(), 0);
        assert_eq!(Category::Dogs.label(), 1);
        assert_eq!(Category::ALL, [Category::Cats, Category::Dogs]);
    }

    #[test]
    fn test_prefix_and_singular() {
        assert_eq!(Category::Cats.prefix(), "cats/");
        assert_eq!(Category::Dogs.singular(), "dog");
    }

    #[test]
    fn test_sample_name_is_zero_padded() {
        let s = Sample::new(Category::Cats, "cats/a.jpg", 7);
        assert_eq!(s.name, "cat_0007");
        assert_eq!(s.label(), 0);

        let s = Sample::new(Category::Dogs, "dogs/b.jpg", 12345);
        assert_eq!(s.name, "dog_12345");
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Category::from_label(1), Some(Category::Dogs));
        assert_eq!(Category::from_label(5), None);
    }
}
