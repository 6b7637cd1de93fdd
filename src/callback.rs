//! Callables that can be bound into a [`SettingsHandle`](crate::SettingsHandle)
//!
//! Both callback kinds share one shape: a single-method trait the bridge
//! invokes, and a [`Callback`] slot value that is either a bound callable or
//! the named `Noop` sentinel. Closures get the traits through blanket impls;
//! scripting hosts implement them on their own function types.

use std::fmt;
use std::rc::Rc;

/// Answers whether the cell at `(x, y)` blocks line of sight.
pub trait OpacityTest<H: ?Sized> {
    fn is_opaque(&self, map: &H, x: i32, y: i32) -> anyhow::Result<bool>;
}

/// Notified once a cell is lit; `(dx, dy)` is the offset from the source.
pub trait ApplyLighting<H: ?Sized> {
    fn apply(&self, map: &H, x: i32, y: i32, dx: i32, dy: i32, source: &H) -> anyhow::Result<()>;
}

impl<H: ?Sized, F> OpacityTest<H> for F
where
    F: Fn(&H, i32, i32) -> anyhow::Result<bool>,
{
    fn is_opaque(&self, map: &H, x: i32, y: i32) -> anyhow::Result<bool> {
        self(map, x, y)
    }
}

impl<H: ?Sized, F> ApplyLighting<H> for F
where
    F: Fn(&H, i32, i32, i32, i32, &H) -> anyhow::Result<()>,
{
    fn apply(&self, map: &H, x: i32, y: i32, dx: i32, dy: i32, source: &H) -> anyhow::Result<()> {
        self(map, x, y, dx, dy, source)
    }
}

/// Value of a callback slot.
///
/// `Noop` stands in for "nothing bound": the opacity trampoline answers
/// `false` and the lighting trampoline does nothing, without invoking anything.
pub enum Callback<T: ?Sized> {
    Noop,
    Bound(Rc<T>),
}

impl<T: ?Sized> Callback<T> {
    pub fn is_noop(&self) -> bool {
        matches!(self, Callback::Noop)
    }

    /// Identity comparison: two `Bound` values are equal only when they share
    /// the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callback::Noop, Callback::Noop) => true,
            (Callback::Bound(a), Callback::Bound(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_bound(&self) -> Option<&Rc<T>> {
        match self {
            Callback::Noop => None,
            Callback::Bound(f) => Some(f),
        }
    }
}

impl<H: ?Sized + 'static> Callback<dyn OpacityTest<H>> {
    /// Bind a closure as an opacity test.
    pub fn opacity<F>(f: F) -> Self
    where
        F: Fn(&H, i32, i32) -> anyhow::Result<bool> + 'static,
    {
        let f: Rc<dyn OpacityTest<H>> = Rc::new(f);
        Callback::Bound(f)
    }
}

impl<H: ?Sized + 'static> Callback<dyn ApplyLighting<H>> {
    /// Bind a closure as a lighting handler.
    pub fn lighting<F>(f: F) -> Self
    where
        F: Fn(&H, i32, i32, i32, i32, &H) -> anyhow::Result<()> + 'static,
    {
        let f: Rc<dyn ApplyLighting<H>> = Rc::new(f);
        Callback::Bound(f)
    }
}

// Derived Clone would require `T: Clone`.
impl<T: ?Sized> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Callback::Noop => Callback::Noop,
            Callback::Bound(f) => Callback::Bound(Rc::clone(f)),
        }
    }
}

impl<T: ?Sized> Default for Callback<T> {
    fn default() -> Self {
        Callback::Noop
    }
}

impl<T: ?Sized> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Noop => f.write_str("Callback::Noop"),
            Callback::Bound(cb) => write!(f, "Callback::Bound({:p})", Rc::as_ptr(cb)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_noop() {
        let cb: Callback<dyn OpacityTest<()>> = Callback::default();
        assert!(cb.is_noop());
        assert!(cb.as_bound().is_none());
    }

    #[test]
    fn clones_share_identity() {
        let cb = Callback::<dyn OpacityTest<()>>::opacity(|_, x, _| Ok(x > 0));
        let other = Callback::<dyn OpacityTest<()>>::opacity(|_, x, _| Ok(x > 0));
        assert!(cb.ptr_eq(&cb.clone()));
        assert!(!cb.ptr_eq(&other));
        assert!(!cb.ptr_eq(&Callback::Noop));
    }

    #[test]
    fn closures_dispatch_through_traits() {
        let opacity = Callback::<dyn OpacityTest<u8>>::opacity(|m, x, y| Ok(*m as i32 == x + y));
        let f = opacity.as_bound().unwrap();
        assert!(f.is_opaque(&3, 1, 2).unwrap());
        assert!(!f.is_opaque(&3, 2, 2).unwrap());

        let lighting = Callback::<dyn ApplyLighting<u8>>::lighting(|_, _, _, dx, _, src| {
            anyhow::ensure!(dx >= 0, "negative dx from source {src}");
            Ok(())
        });
        let g = lighting.as_bound().unwrap();
        assert!(g.apply(&0, 0, 0, 1, 0, &9).is_ok());
        let err = g.apply(&0, 0, 0, -1, 0, &9).unwrap_err();
        assert!(err.to_string().contains("source 9"));
    }
}
