//! Naming conventions for tables and attributes.

/// Derives table names from model class names and attribute names from raw
/// column names.
pub trait Inflector: Send + Sync {
    /// Class name to physical table name (`OrderItem` -> `order_items`).
    fn tableize(&self, class_name: &str) -> String;

    /// Raw column name to attribute name (`OrderDate` -> `order_date`).
    fn variablize(&self, column_name: &str) -> String;
}

/// English-ish snake_case pluralizing inflector.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInflector;

impl DefaultInflector {
    /// Convert CamelCase (or mixed) text to snake_case.
    pub fn underscore(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len() + 4);
        for (i, &c) in chars.iter().enumerate() {
            if c.is_ascii_uppercase() {
                let prev = i.checked_sub(1).and_then(|p| chars.get(p));
                let next = chars.get(i + 1);
                let boundary = match prev {
                    Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                    Some(p) if p.is_ascii_uppercase() => next.is_some_and(char::is_ascii_lowercase),
                    _ => false,
                };
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            } else if c == '-' || c == ' ' {
                out.push('_');
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Naive English plural of a lowercase word.
    pub fn pluralize(word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }
        if let Some(stem) = word.strip_suffix('y') {
            let before = stem.chars().last();
            if before.is_some_and(|c| !"aeiou".contains(c)) {
                return format!("{stem}ies");
            }
        }
        if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
            return format!("{word}es");
        }
        format!("{word}s")
    }
}

impl Inflector for DefaultInflector {
    fn tableize(&self, class_name: &str) -> String {
        // Namespaced names keep only the last segment.
        let base = class_name.rsplit("::").next().unwrap_or(class_name);
        let snake = Self::underscore(base);
        match snake.rsplit_once('_') {
            Some((head, last)) => format!("{head}_{}", Self::pluralize(last)),
            None => Self::pluralize(&snake),
        }
    }

    fn variablize(&self, column_name: &str) -> String {
        Self::underscore(column_name).to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tableize_pluralizes_last_word() {
        let inf = DefaultInflector;
        assert_eq!(inf.tableize("Order"), "orders");
        assert_eq!(inf.tableize("OrderItem"), "order_items");
        assert_eq!(inf.tableize("Category"), "categories");
        assert_eq!(inf.tableize("Box"), "boxes");
        assert_eq!(inf.tableize("Batch"), "batches");
        assert_eq!(inf.tableize("Day"), "days");
        assert_eq!(inf.tableize("shop::Order"), "orders");
    }

    #[test]
    fn underscore_handles_acronyms() {
        assert_eq!(DefaultInflector::underscore("HTTPRequest"), "http_request");
        assert_eq!(DefaultInflector::underscore("userId"), "user_id");
        assert_eq!(DefaultInflector::underscore("already_snake"), "already_snake");
    }

    #[test]
    fn variablize_lowercases() {
        assert_eq!(DefaultInflector.variablize("OrderDate"), "order_date");
        assert_eq!(DefaultInflector.variablize("ID"), "id");
    }
}
