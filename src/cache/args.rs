//! Call Arguments Module
//!
//! Exposes the arguments of a memoized call as positional and keyword
//! representations for key derivation.

use crate::cache::repr::Repr;

// == Cache Args Trait ==
/// Arguments of a memoized call.
///
/// Tuples map to positional arguments. Implement this trait on a struct to
/// expose its fields as keyword arguments:
///
/// ```
/// use persistent_memo::cache::{CacheArgs, Repr};
///
/// struct Resize {
///     path: String,
///     width: u32,
///     height: u32,
/// }
///
/// impl CacheArgs for Resize {
///     fn positional(&self) -> Vec<&dyn Repr> {
///         vec![&self.path as &dyn Repr]
///     }
///
///     fn keywords(&self) -> Vec<(&str, &dyn Repr)> {
///         vec![
///             ("width", &self.width as &dyn Repr),
///             ("height", &self.height as &dyn Repr),
///         ]
///     }
/// }
/// ```
pub trait CacheArgs {
    /// Positional arguments in call order.
    fn positional(&self) -> Vec<&dyn Repr>;

    /// Keyword arguments in any order; key derivation sorts them by name.
    fn keywords(&self) -> Vec<(&str, &dyn Repr)> {
        Vec::new()
    }
}

impl CacheArgs for () {
    fn positional(&self) -> Vec<&dyn Repr> {
        Vec::new()
    }
}

impl<T: CacheArgs + ?Sized> CacheArgs for &T {
    fn positional(&self) -> Vec<&dyn Repr> {
        (**self).positional()
    }

    fn keywords(&self) -> Vec<(&str, &dyn Repr)> {
        (**self).keywords()
    }
}

macro_rules! args_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Repr),+> CacheArgs for ($($name,)+) {
            fn positional(&self) -> Vec<&dyn Repr> {
                vec![$(&self.$idx as &dyn Repr),+]
            }
        }
    };
}

args_tuple!(A: 0);
args_tuple!(A: 0, B: 1);
args_tuple!(A: 0, B: 1, C: 2);
args_tuple!(A: 0, B: 1, C: 2, D: 3);
args_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
args_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

// == Args Builder ==
/// Dynamically assembled argument list with positional and keyword values.
#[derive(Default)]
pub struct Args {
    positional: Vec<Box<dyn Repr>>,
    keywords: Vec<(String, Box<dyn Repr>)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Repr + 'static>(mut self, value: T) -> Self {
        self.positional.push(Box::new(value));
        self
    }

    /// Sets a keyword argument, replacing an earlier one with the same name.
    pub fn kwarg<T: Repr + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        let name = name.into();
        self.keywords.retain(|(existing, _)| *existing != name);
        self.keywords.push((name, Box::new(value)));
        self
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let positional: Vec<String> = self.positional.iter().map(|v| v.repr()).collect();
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.repr()))
            .collect();
        f.debug_struct("Args")
            .field("positional", &positional)
            .field("keywords", &keywords)
            .finish()
    }
}

impl CacheArgs for Args {
    fn positional(&self) -> Vec<&dyn Repr> {
        self.positional.iter().map(|v| v.as_ref()).collect()
    }

    fn keywords(&self) -> Vec<(&str, &dyn Repr)> {
        self.keywords
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_ref()))
            .collect()
    }
}
