//! カテゴリ判定
//!
//! 商品名を小文字化し、カテゴリごとのキーワードを固定順で照合する。
//! 最初にヒットしたカテゴリを返すため、先に判定するカテゴリが
//! 後のカテゴリとのキーワード重複を覆い隠す。

use crate::types::Category;

/// カテゴリ判定ルール（順序つき）
#[derive(Debug, Clone)]
pub struct CategoryRules {
    rules: Vec<(Category, Vec<&'static str>)>,
}

impl CategoryRules {
    pub fn new(rules: Vec<(Category, Vec<&'static str>)>) -> Self {
        Self { rules }
    }

    /// 商品名のカテゴリを判定（どれにも一致しなければ Other）
    pub fn categorize(&self, name: &str) -> Category {
        let lowered = name.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::new(vec![
            (
                Category::DairyAlternatives,
                vec![
                    "almond milk", "oat milk", "soy milk", "coconut milk", "rice milk",
                    "plant-based", "dairy-free", "dairy free", "vegan",
                ],
            ),
            (
                Category::Meat,
                vec![
                    "beef", "steak", "veal", "lamb", "pork", "bacon", "ham", "sausage",
                    "salami", "chicken", "turkey", "burger", "meat",
                ],
            ),
            (
                Category::Seafood,
                vec![
                    "fish", "salmon", "tuna", "shrimp", "prawn", "cod", "crab", "lobster",
                    "tilapia", "seafood",
                ],
            ),
            (
                Category::Dairy,
                vec!["milk", "cheese", "yogurt", "yoghurt", "butter", "cream", "egg"],
            ),
            (
                Category::Vegetables,
                vec![
                    "vegetable", "veggie", "lettuce", "spinach", "kale", "carrot", "broccoli",
                    "potato", "tomato", "onion", "pepper", "cucumber", "cabbage", "celery",
                    "zucchini", "garlic", "bean", "lentil",
                ],
            ),
            (
                Category::Fruits,
                vec![
                    "fruit", "apple", "banana", "orange", "berry", "berries", "grape",
                    "avocado", "mango", "lemon", "lime", "pear", "peach", "melon",
                ],
            ),
            (
                Category::Grains,
                vec!["rice", "pasta", "oat", "wheat", "cereal", "flour", "quinoa", "noodle", "grain"],
            ),
            (
                Category::Bakery,
                vec!["bread", "bagel", "croissant", "muffin", "bun", "tortilla", "cake"],
            ),
            (
                Category::Snacks,
                vec![
                    "chip", "crisp", "cookie", "candy", "chocolate", "cracker", "popcorn",
                    "pretzel", "snack",
                ],
            ),
            (
                Category::Beverages,
                vec![
                    "soda", "cola", "juice", "water", "coffee", "tea", "beer", "wine",
                    "lemonade", "drink",
                ],
            ),
            (
                Category::Household,
                vec![
                    "detergent", "soap", "towel", "toilet", "tissue", "cleaner", "bleach",
                    "sponge", "foil", "wrap", "shampoo",
                ],
            ),
            (Category::Packaging, vec!["bag", "container", "bottle"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_basic() {
        let rules = CategoryRules::default();
        assert_eq!(rules.categorize("Ribeye Steak"), Category::Meat);
        assert_eq!(rules.categorize("Baby Spinach"), Category::Vegetables);
        assert_eq!(rules.categorize("Sourdough Bread"), Category::Bakery);
        assert_eq!(rules.categorize("Sparkling Water"), Category::Beverages);
    }

    #[test]
    fn test_categorize_default_other() {
        let rules = CategoryRules::default();
        assert_eq!(rules.categorize("AA Batteries"), Category::Other);
        assert_eq!(rules.categorize(""), Category::Other);
    }

    #[test]
    fn test_categorize_order_shadows_later_categories() {
        let rules = CategoryRules::default();
        // "milk" は Dairy のキーワードだが、先に判定する代替乳に一致する
        assert_eq!(rules.categorize("Oat Milk Barista"), Category::DairyAlternatives);
        // "orange" (Fruits) が "juice" (Beverages) より先
        assert_eq!(rules.categorize("Orange Juice"), Category::Fruits);
    }

    #[test]
    fn test_custom_rules() {
        let rules = CategoryRules::new(vec![(Category::Household, vec!["battery", "batteries"])]);
        assert_eq!(rules.categorize("AA Batteries"), Category::Household);
        assert_eq!(rules.categorize("Ribeye Steak"), Category::Other);
    }
}
