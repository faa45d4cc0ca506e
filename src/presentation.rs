// 🎨 Presentation Lookup - Display metadata keyed by domain values
//
// The domain types carry no rendering concerns; anything a screen needs
// (icons, colors, card titles, money formatting) is looked up here.

use serde::Serialize;

use crate::entities::ExpenseCategory;
use crate::store::ExpenseStore;

// ============================================================================
// COLORS & STYLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Blue,
    Green,
    Orange,
    Red,
    Purple,
}

impl DisplayColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayColor::Blue => "blue",
            DisplayColor::Green => "green",
            DisplayColor::Orange => "orange",
            DisplayColor::Red => "red",
            DisplayColor::Purple => "purple",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    /// Icon shown on each expense row
    pub icon: &'static str,
    /// Icon shown on the category's summary card
    pub card_icon: &'static str,
    pub color: DisplayColor,
    /// Title of the category's expense list
    pub list_title: &'static str,
}

pub fn category_style(category: ExpenseCategory) -> CategoryStyle {
    match category {
        ExpenseCategory::Personal => CategoryStyle {
            icon: "person.fill",
            card_icon: "person.circle.fill",
            color: DisplayColor::Blue,
            list_title: "Personal Expenses",
        },
        ExpenseCategory::Business => CategoryStyle {
            icon: "briefcase.fill",
            card_icon: "briefcase.circle.fill",
            color: DisplayColor::Green,
            list_title: "Business Expenses",
        },
    }
}

// ============================================================================
// AMOUNT TIERS
// ============================================================================

/// How loud an amount is rendered: under 10, under 100, or more
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmountTier {
    Low,
    Medium,
    High,
}

impl AmountTier {
    pub fn of(amount: f64) -> Self {
        if amount < 10.0 {
            AmountTier::Low
        } else if amount < 100.0 {
            AmountTier::Medium
        } else {
            AmountTier::High
        }
    }

    pub fn color(&self) -> DisplayColor {
        match self {
            AmountTier::Low => DisplayColor::Green,
            AmountTier::Medium => DisplayColor::Orange,
            AmountTier::High => DisplayColor::Red,
        }
    }
}

// ============================================================================
// SUMMARY CARDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub title: &'static str,
    pub amount: f64,
    pub color: DisplayColor,
    pub icon: &'static str,
}

/// Total, Personal and Business cards, in display order
pub fn summary_cards(store: &ExpenseStore) -> Vec<SummaryCard> {
    let mut cards = vec![SummaryCard {
        title: "Total",
        amount: store.grand_total(),
        color: DisplayColor::Purple,
        icon: "dollarsign.circle.fill",
    }];

    for category in ExpenseCategory::ALL {
        let style = category_style(category);
        cards.push(SummaryCard {
            title: category.as_str(),
            amount: store.total_for(category),
            color: style.color,
            icon: style.card_icon,
        });
    }

    cards
}

// ============================================================================
// MONEY FORMATTING
// ============================================================================

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "BRL" => Some("R$"),
        _ => None,
    }
}

fn group_thousands(whole: u64) -> String {
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Two decimals, thousands grouped: `format_amount(1234.5, "USD")` -> `$1,234.50`
pub fn format_amount(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let body = format!("{}.{:02}", group_thousands(cents / 100), cents % 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    match currency_symbol(currency) {
        Some(symbol) => format!("{}{}{}", sign, symbol, body),
        None => format!("{}{} {}", sign, body, currency.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::entities::ExpenseItem;

    #[test]
    fn test_category_styles() {
        let personal = category_style(ExpenseCategory::Personal);
        assert_eq!(personal.icon, "person.fill");
        assert_eq!(personal.color, DisplayColor::Blue);

        let business = category_style(ExpenseCategory::Business);
        assert_eq!(business.icon, "briefcase.fill");
        assert_eq!(business.color, DisplayColor::Green);
    }

    #[test]
    fn test_amount_tier_boundaries() {
        assert_eq!(AmountTier::of(9.99), AmountTier::Low);
        assert_eq!(AmountTier::of(10.0), AmountTier::Medium);
        assert_eq!(AmountTier::of(99.99), AmountTier::Medium);
        assert_eq!(AmountTier::of(100.0), AmountTier::High);
        assert_eq!(AmountTier::High.color(), DisplayColor::Red);
    }

    #[test]
    fn test_summary_cards_follow_store() {
        let mut store = ExpenseStore::with_defaults(MemoryBackend::new());
        store.add(ExpenseItem::new("Groceries", ExpenseCategory::Personal, 10.0));
        store.add(ExpenseItem::new("Software", ExpenseCategory::Business, 25.0));

        let cards = summary_cards(&store);

        let titles: Vec<&str> = cards.iter().map(|card| card.title).collect();
        assert_eq!(titles, vec!["Total", "Personal", "Business"]);
        assert_eq!(cards[0].amount, 35.0);
        assert_eq!(cards[1].amount, 10.0);
        assert_eq!(cards[2].amount, 25.0);
        assert_eq!(cards[2].icon, "briefcase.circle.fill");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(4.5, "USD"), "$4.50");
        assert_eq!(format_amount(1234567.891, "usd"), "$1,234,567.89");
        assert_eq!(format_amount(0.0, "BRL"), "R$0.00");
        assert_eq!(format_amount(999.999, "EUR"), "€1,000.00");
        assert_eq!(format_amount(12.0, "CHF"), "12.00 CHF");
        assert_eq!(format_amount(-3.2, "GBP"), "-£3.20");
    }
}
