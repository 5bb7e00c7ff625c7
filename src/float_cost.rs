use std::cmp::Eq;
use std::fmt::Debug;

use derive_more::Display;
use num_traits::Zero;
use ordered_float::FloatCore;
use ordered_float::OrderedFloat;

/// A totally ordered float used for priorities, distances and edge weights.
///
/// `NaN` sorts after every other value, so a broken weight never outranks a
/// real one.
#[derive(Copy, Clone, Default, Debug, Display)]
#[repr(transparent)]
#[display("${_0}")]
pub struct FloatCost<F: FloatCore>(pub OrderedFloat<F>);

impl<F> FloatCost<F>
where
    F: FloatCore,
{
    pub fn new(f: F) -> Self {
        Self(OrderedFloat(f))
    }
    #[inline(always)]
    pub fn get(&self) -> F {
        self.0.0
    }
}

impl<F> std::ops::Add for FloatCost<F>
where
    OrderedFloat<F>: std::ops::Add<OrderedFloat<F>, Output = OrderedFloat<F>>,
    F: FloatCore,
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl<F> Zero for FloatCost<F>
where
    F: FloatCore,
{
    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.0 == OrderedFloat::zero()
    }
    #[inline(always)]
    fn zero() -> Self {
        Self(OrderedFloat::zero())
    }
}

impl<F> PartialOrd for FloatCost<F>
where
    F: FloatCore,
{
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // `PartialOrd` is forwarded to `OrderedFloat`
        Some(self.0.cmp(&other.0))
    }
}
impl<F> Ord for FloatCost<F>
where
    OrderedFloat<F>: Ord,
    F: FloatCore,
{
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // `Ord` is forwarded to `OrderedFloat`
        self.0.cmp(&other.0)
    }
}
impl<F> PartialEq for FloatCost<F>
where
    F: FloatCore,
{
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        let s: OrderedFloat<F> = self.0;
        let o: OrderedFloat<F> = other.0;
        s.eq(&o)
    }
}
impl<F> Eq for FloatCost<F> where F: FloatCore {}
