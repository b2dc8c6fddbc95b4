//! Reference-counted, interior-mutable storage for arrays held by a
//! [`Solution`][crate::solution::Solution].
//!
//! Cloning a [`Shared`] produces another handle to the *same* value, so a
//! shallow copy of a solution sees in-place edits made through the original
//! and vice-versa. [`Shared::deep_clone`] allocates fresh storage instead.

use std::{
    cell::{ Ref, RefCell, RefMut },
    rc::Rc,
};

/// Shared handle to a value of type `A`.
#[derive(Debug, Default)]
pub struct Shared<A>(Rc<RefCell<A>>);

impl<A> Clone for Shared<A> {
    fn clone(&self) -> Self { Self(Rc::clone(&self.0)) }
}

impl<A> From<A> for Shared<A> {
    fn from(value: A) -> Self { Self::new(value) }
}

/// Two handles compare equal if their values do, whether or not they share
/// storage.
impl<A> PartialEq for Shared<A>
where A: PartialEq
{
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.borrow() == *other.borrow()
    }
}

impl<A> Shared<A> {
    /// Wrap a value in fresh storage.
    pub fn new(value: A) -> Self { Self(Rc::new(RefCell::new(value))) }

    /// Immutably borrow the value.
    ///
    /// *Panics* if the value is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, A> { self.0.borrow() }

    /// Mutably borrow the value.
    ///
    /// *Panics* if the value is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, A> { self.0.borrow_mut() }

    /// Replace the value in place, returning the old one. All handles sharing
    /// storage with `self` observe the new value.
    pub fn replace(&self, value: A) -> A { self.0.replace(value) }

    /// Return `true` if both handles point to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

    /// Number of handles currently sharing this storage.
    pub fn handle_count(&self) -> usize { Rc::strong_count(&self.0) }
}

impl<A> Shared<A>
where A: Clone
{
    /// Copy the value into new, unshared storage.
    pub fn deep_clone(&self) -> Self { Self::new(self.borrow().clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray as nd;

    #[test]
    fn clone_shares_storage() {
        let a: Shared<nd::Array1<f64>> = nd::array![1.0, 2.0].into();
        let b = a.clone();
        b.borrow_mut()[0] = 5.0;
        assert_eq!(a.borrow()[0], 5.0);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.handle_count(), 2);
    }

    #[test]
    fn deep_clone_detaches() {
        let a: Shared<nd::Array1<f64>> = nd::array![1.0, 2.0].into();
        let b = a.deep_clone();
        b.borrow_mut()[0] = 5.0;
        assert_eq!(a.borrow()[0], 1.0);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, b);
    }
}
