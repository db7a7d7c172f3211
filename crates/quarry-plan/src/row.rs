//! Pairing structure built up by flat-join execution.
//!
//! Each join step wraps the rows produced so far: a row that has passed
//! through N steps is a left-nested pairing of N+1 elements, with the most
//! recently joined element innermost. [`FlatJoinStep::outer_hops`] and
//! [`FlatAccessor::outer_hops`] both count hops through the `outer` side of
//! this structure, so anchoring a join and reading a projected field use the
//! same walk.
//!
//! [`FlatJoinStep::outer_hops`]: crate::query::FlatJoinStep
//! [`FlatAccessor::outer_hops`]: crate::query::FlatAccessor

/// A row in flat-join space: either a bare root element or a pairing of an
/// outer row with the element joined at one step.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinRow<E> {
    /// An unjoined root element.
    Leaf(E),
    /// A row extended by one join step.
    Paired {
        /// Everything joined before this step.
        outer: Box<JoinRow<E>>,
        /// The element joined at this step.
        inner: E,
    },
}

impl<E> JoinRow<E> {
    /// Wrap an outer row and a newly joined element.
    pub fn pair(outer: JoinRow<E>, inner: E) -> Self {
        JoinRow::Paired {
            outer: Box::new(outer),
            inner,
        }
    }

    /// Number of join steps this row has passed through.
    pub fn depth(&self) -> u32 {
        match self {
            JoinRow::Leaf(_) => 0,
            JoinRow::Paired { outer, .. } => outer.depth() + 1,
        }
    }

    /// The row after walking `hops` steps through the outer side.
    pub fn outer_at(&self, hops: u32) -> &JoinRow<E> {
        let mut row = self;
        for _ in 0..hops {
            match row {
                JoinRow::Paired { outer, .. } => row = outer,
                JoinRow::Leaf(_) => return row,
            }
        }
        row
    }

    /// The element `hops` outer steps away from the top of the row.
    ///
    /// Walks `hops` steps through the outer side, then reads the element at
    /// that position: the inner element of a pairing, or the bare element of
    /// a leaf. With `hops` equal to [`depth`](Self::depth) this reaches the
    /// root element.
    pub fn element_at(&self, hops: u32) -> &E {
        match self.outer_at(hops) {
            JoinRow::Leaf(element) => element,
            JoinRow::Paired { inner, .. } => inner,
        }
    }

    /// The root element the row was built from.
    pub fn root(&self) -> &E {
        match self {
            JoinRow::Leaf(element) => element,
            JoinRow::Paired { outer, .. } => outer.root(),
        }
    }
}
