//! Argument Representation Module
//!
//! Stable textual representations of call arguments. The cache key is a
//! digest over these strings, so two values that print the same share a cache
//! entry and two values that print differently never do.
//!
//! A representation must be identical across process runs. Hash-based
//! collections are therefore printed in sorted order, and pointer identity is
//! never part of the output.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

// == Repr Trait ==
/// Deterministic structural printer for cache arguments.
///
/// Implemented for primitives, strings, `Option`, sequences, tuples, sets and
/// maps built from them, and common pointer types. Implement it for your own
/// argument types; the output must only depend on the fields that matter for
/// the cached computation.
pub trait Repr {
    fn repr(&self) -> String;
}

/// Representation function applied to every argument when deriving a key.
///
/// It receives type-erased values; see [`CacheOptions::with_repr`](crate::cache::CacheOptions::with_repr).
pub type ReprFn = Arc<dyn Fn(&dyn Repr) -> String + Send + Sync>;

/// The default representation function: delegates to [`Repr::repr`].
pub fn default_repr(value: &dyn Repr) -> String {
    value.repr()
}

macro_rules! repr_via_debug {
    ($($t:ty),* $(,)?) => {
        $(
            impl Repr for $t {
                fn repr(&self) -> String {
                    format!("{:?}", self)
                }
            }
        )*
    };
}

repr_via_debug!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, str,
    String, Path, PathBuf,
);

impl Repr for () {
    fn repr(&self) -> String {
        "()".to_string()
    }
}

impl<T: Repr + ?Sized> Repr for &T {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

impl<T: Repr + ?Sized> Repr for &mut T {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

impl<T: Repr + ?Sized> Repr for Box<T> {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

impl<T: Repr + ?Sized> Repr for Rc<T> {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

impl<T: Repr + ?Sized> Repr for Arc<T> {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

impl<T: Repr> Repr for Option<T> {
    fn repr(&self) -> String {
        match self {
            Some(value) => format!("Some({})", value.repr()),
            None => "None".to_string(),
        }
    }
}

fn join<'a, I, T>(items: I) -> String
where
    I: IntoIterator<Item = &'a T>,
    T: Repr + 'a,
{
    items
        .into_iter()
        .map(Repr::repr)
        .collect::<Vec<_>>()
        .join(", ")
}

impl<T: Repr> Repr for [T] {
    fn repr(&self) -> String {
        format!("[{}]", join(self))
    }
}

impl<T: Repr, const N: usize> Repr for [T; N] {
    fn repr(&self) -> String {
        self.as_slice().repr()
    }
}

impl<T: Repr> Repr for Vec<T> {
    fn repr(&self) -> String {
        self.as_slice().repr()
    }
}

impl<T: Repr> Repr for VecDeque<T> {
    fn repr(&self) -> String {
        format!("[{}]", join(self))
    }
}

impl<T: Repr> Repr for BTreeSet<T> {
    fn repr(&self) -> String {
        format!("{{{}}}", join(self))
    }
}

impl<T: Repr, S> Repr for HashSet<T, S> {
    fn repr(&self) -> String {
        let mut items: Vec<String> = self.iter().map(Repr::repr).collect();
        items.sort();
        format!("{{{}}}", items.join(", "))
    }
}

impl<K: Repr, V: Repr> Repr for BTreeMap<K, V> {
    fn repr(&self) -> String {
        let items: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
            .collect();
        format!("{{{}}}", items.join(", "))
    }
}

impl<K: Repr, V: Repr, S> Repr for HashMap<K, V, S> {
    fn repr(&self) -> String {
        let mut items: Vec<(String, String)> =
            self.iter().map(|(k, v)| (k.repr(), v.repr())).collect();
        items.sort();
        let items: Vec<String> = items
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        format!("{{{}}}", items.join(", "))
    }
}

macro_rules! repr_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Repr),+> Repr for ($($name,)+) {
            fn repr(&self) -> String {
                let parts = [$(self.$idx.repr()),+];
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
        }
    };
}

repr_tuple!(A: 0);
repr_tuple!(A: 0, B: 1);
repr_tuple!(A: 0, B: 1, C: 2);
repr_tuple!(A: 0, B: 1, C: 2, D: 3);
repr_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
repr_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
