// SPDX-License-Identifier: MPL-2.0
//! Shorthand for composing up to three localizers.
//!
//! [`Localizer::build`] accepts a single localizer or a tuple of two or three
//! and a transform over their outputs. The [`localize!`](crate::localize)
//! macro goes one step further and starts from lookup keys:
//!
//! ```
//! use reactive_l10n::i18n::{Localization, Preferences, TableResolver};
//! use reactive_l10n::localize;
//!
//! let resolver = TableResolver::new()
//!     .with_system_language("en".parse()?)
//!     .with_entry("part-1", "en", "Part 1")?
//!     .with_entry("part-2", "en", "Part 2")?;
//! let l10n = Localization::new(Preferences::in_memory(), resolver);
//!
//! let title = localize!(l10n; "part-1", "part-2" => |a, b| format!("{} / {}", a, b));
//! assert_eq!(title.localize(), "Part 1 / Part 2");
//! # Ok::<(), reactive_l10n::error::Error>(())
//! ```

use super::localizer::Localizer;

/// One, two or three localizers evaluated together.
pub trait LocalizerGroup {
    /// What the group produces when run: a value or a tuple of values.
    type Output: 'static;

    fn localizer<R, F>(self, transform: F) -> Localizer<R>
    where
        R: 'static,
        F: Fn(Self::Output) -> R + Send + Sync + 'static;
}

impl<A: 'static> LocalizerGroup for Localizer<A> {
    type Output = A;

    fn localizer<R, F>(self, transform: F) -> Localizer<R>
    where
        R: 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.map(transform)
    }
}

impl<A: 'static, B: 'static> LocalizerGroup for (Localizer<A>, Localizer<B>) {
    type Output = (A, B);

    fn localizer<R, F>(self, transform: F) -> Localizer<R>
    where
        R: 'static,
        F: Fn((A, B)) -> R + Send + Sync + 'static,
    {
        let (first, second) = self;
        first.combine(second).map(transform)
    }
}

impl<A: 'static, B: 'static, C: 'static> LocalizerGroup for (Localizer<A>, Localizer<B>, Localizer<C>) {
    type Output = (A, B, C);

    fn localizer<R, F>(self, transform: F) -> Localizer<R>
    where
        R: 'static,
        F: Fn((A, B, C)) -> R + Send + Sync + 'static,
    {
        let (first, second, third) = self;
        first.combine3(second, third).map(transform)
    }
}

impl<T: 'static> Localizer<T> {
    /// Runs `group` and feeds its output to `transform`.
    pub fn build<G, F>(group: G, transform: F) -> Self
    where
        G: LocalizerGroup,
        F: Fn(G::Output) -> T + Send + Sync + 'static,
    {
        group.localizer(transform)
    }
}

#[doc(hidden)]
pub fn spread2<A, B, R, F>(transform: F) -> impl Fn((A, B)) -> R + Send + Sync + 'static
where
    F: Fn(A, B) -> R + Send + Sync + 'static,
{
    move |(a, b)| transform(a, b)
}

#[doc(hidden)]
pub fn spread3<A, B, C, R, F>(transform: F) -> impl Fn((A, B, C)) -> R + Send + Sync + 'static
where
    F: Fn(A, B, C) -> R + Send + Sync + 'static,
{
    move |(a, b, c)| transform(a, b, c)
}

/// Builds a localizer from one to three lookup keys of a [`Localization`](crate::i18n::Localization).
///
/// `localize!(ctx; "a", "b" => |a, b| ...)` resolves each key through
/// `ctx.pure` and passes the texts to the closure in order.
#[macro_export]
macro_rules! localize {
    ($ctx:expr; $a:expr => $transform:expr $(,)?) => {{
        let ctx = &$ctx;
        ctx.pure($a).map($transform)
    }};
    ($ctx:expr; $a:expr, $b:expr => $transform:expr $(,)?) => {{
        let ctx = &$ctx;
        $crate::i18n::Localizer::build(
            (ctx.pure($a), ctx.pure($b)),
            $crate::i18n::builder::spread2::<::std::string::String, ::std::string::String, _, _>(
                $transform,
            ),
        )
    }};
    ($ctx:expr; $a:expr, $b:expr, $c:expr => $transform:expr $(,)?) => {{
        let ctx = &$ctx;
        $crate::i18n::Localizer::build(
            (ctx.pure($a), ctx.pure($b), ctx.pure($c)),
            $crate::i18n::builder::spread3::<
                ::std::string::String,
                ::std::string::String,
                ::std::string::String,
                _,
                _,
            >($transform),
        )
    }};
}
