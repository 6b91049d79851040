//! Resolution of free-text user input: product names, stock lists and
//! blacklist rules

use std::collections::{BTreeMap, HashSet};

use regex::Regex;

use crate::catalog::Catalog;
use crate::config::Blacklist;
use crate::error::InputError;
use crate::models::{ItemId, PlanError};

/// Resolve a product name to an item id.
///
/// Exact case-insensitive match first, then the first item (by ascending id)
/// whose name contains the query. Ambiguous partial matches are not reported.
pub fn resolve_product(catalog: &Catalog, name: &str) -> Option<ItemId> {
    let query = name.trim();
    if query.is_empty() {
        return None;
    }
    if let Some(id) = catalog.find_exact(query) {
        return Some(id);
    }
    let lowered = query.to_lowercase();
    catalog
        .items()
        .find(|item| item.name.to_lowercase().contains(&lowered))
        .map(|item| item.id)
}

/// Quantities on hand, keyed by item
pub type StockMap = BTreeMap<ItemId, u64>;

/// Parser for pasted stock lists (`<name><whitespace><quantity>` per line)
#[derive(Debug, Clone)]
pub struct StockParser {
    line_re: Regex,
    separator_re: Regex,
}

impl StockParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            line_re: Regex::new(r"^(.+?)\s+(\S+)$")?,
            separator_re: Regex::new(r"^(.+?)\s*([:=;])\s*(\S+)$")?,
        })
    }

    /// Parse a stock list. Bad lines are reported and skipped; duplicates sum.
    pub fn parse(&self, catalog: &Catalog, text: &str) -> (StockMap, Vec<PlanError>) {
        let mut stock = StockMap::new();
        let mut errors = Vec::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match self.parse_line(catalog, line) {
                Ok((id, quantity)) => *stock.entry(id).or_default() += quantity,
                Err(e) => errors.push(PlanError::new(line, e)),
            }
        }

        (stock, errors)
    }

    fn parse_line(&self, catalog: &Catalog, line: &str) -> Result<(ItemId, u64), InputError> {
        if let Some(cap) = self.separator_re.captures(line) {
            let sep = cap[2].chars().next().unwrap_or(':');
            return Err(InputError::InvalidSeparator(sep));
        }

        let cap = self.line_re.captures(line).ok_or(InputError::MalformedLine)?;
        let name = cap[1].trim();
        if name.is_empty() {
            return Err(InputError::MalformedLine);
        }
        let quantity = cap[2]
            .parse::<u64>()
            .map_err(|_| InputError::InvalidQuantity(cap[2].to_string()))?;
        let id = catalog
            .find_exact(name)
            .ok_or_else(|| InputError::UnknownItem(name.to_string()))?;

        Ok((id, quantity))
    }
}

/// Blacklist rules prepared for repeated lookups
#[derive(Debug)]
pub struct BlacklistFilter<'a> {
    rules: &'a Blacklist,
    names: HashSet<&'a str>,
}

impl<'a> BlacklistFilter<'a> {
    pub fn new(rules: &'a Blacklist) -> Self {
        Self {
            rules,
            names: rules.custom_names().collect(),
        }
    }

    pub fn contains(&self, catalog: &Catalog, id: ItemId) -> bool {
        if self.rules.is_flagged(catalog.category_of(id)) {
            return true;
        }
        catalog
            .item(id)
            .is_some_and(|item| self.names.contains(item.name.as_str()))
    }
}

/// True if the item's category is flagged or its exact name is listed.
pub fn is_blacklisted(catalog: &Catalog, id: ItemId, rules: &Blacklist) -> bool {
    BlacklistFilter::new(rules).contains(catalog, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Item { id: 34, name: "Tritanium".into(), group_id: 18 },
                Item { id: 4051, name: "Nitrogen Fuel Block".into(), group_id: 1136 },
                Item { id: 11539, name: "Fusion Reactor Unit".into(), group_id: 334 },
                Item { id: 11540, name: "Fusion Reactor Unit II".into(), group_id: 334 },
                Item { id: 16670, name: "Crystalline Carbonide".into(), group_id: 429 },
            ],
            vec![],
        )
    }

    #[test]
    fn resolve_exact_before_partial() {
        let c = catalog();
        assert_eq!(resolve_product(&c, "fusion reactor unit ii"), Some(11540));
        assert_eq!(resolve_product(&c, "Fusion Reactor Unit"), Some(11539));
        assert_eq!(resolve_product(&c, "reactor"), Some(11539));
        assert_eq!(resolve_product(&c, "carbonide"), Some(16670));
        assert_eq!(resolve_product(&c, "Unobtainium"), None);
        assert_eq!(resolve_product(&c, "  "), None);
    }

    #[test]
    fn stock_accepts_tabs_and_spaces_and_sums_duplicates() {
        let c = catalog();
        let parser = StockParser::new().unwrap();
        let (stock, errors) =
            parser.parse(&c, "Tritanium\t1000\n\nTritanium   500\nCrystalline Carbonide 20\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(stock.get(&34), Some(&1500));
        assert_eq!(stock.get(&16670), Some(&20));
    }

    #[test]
    fn stock_reports_bad_lines_and_continues() {
        let c = catalog();
        let parser = StockParser::new().unwrap();
        let text = "Tritanium: 100\nTritanium lots\nMegacyte 5\nTritanium\nTritanium 7";
        let (stock, errors) = parser.parse(&c, text);
        assert_eq!(stock.get(&34), Some(&7));
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0].input, "Tritanium: 100");
        assert_eq!(errors[0].error, InputError::InvalidSeparator(':').to_string());
        assert_eq!(errors[1].error, InputError::InvalidQuantity("lots".into()).to_string());
        assert_eq!(errors[2].error, InputError::UnknownItem("Megacyte".into()).to_string());
        assert_eq!(errors[3].error, InputError::MalformedLine.to_string());
    }

    #[test]
    fn blacklist_by_flag_or_exact_name() {
        let c = catalog();
        let rules = Blacklist {
            fuel_blocks: true,
            custom_items: "Tritanium\nfusion reactor unit".into(),
            ..Blacklist::default()
        };
        assert!(is_blacklisted(&c, 4051, &rules));
        assert!(is_blacklisted(&c, 34, &rules));
        // case-sensitive
        assert!(!is_blacklisted(&c, 11539, &rules));
        assert!(!is_blacklisted(&c, 16670, &rules));
    }
}
