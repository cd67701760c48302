/// A position/coordinate within a genome
///
/// Positions are non-negative, finite, and totally ordered.
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub struct Position(f64);

impl Position {
    /// Create a new Position
    ///
    /// # Returns
    ///
    /// * `Some` if `position` is finite and non-negative
    /// * `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// let p = treeseq_core::Position::new(10.0).unwrap();
    /// assert_eq!(p, 10.0); // can be compared to f64
    /// # assert_eq!(10.0, p);
    /// # assert!(p > 0.0);
    /// # assert!(0.0 < p);
    /// let p2 = treeseq_core::Position::new(10.5).unwrap();
    /// assert!(p < p2);
    /// assert!(treeseq_core::Position::new(-1.0).is_none());
    /// assert!(treeseq_core::Position::new(f64::NAN).is_none());
    /// ```
    pub fn new(position: f64) -> Option<Self> {
        if position.is_finite() && position >= 0.0 {
            Some(Self::from(position))
        } else {
            None
        }
    }

    /// Create a new position from a finite, non-negative value
    ///
    /// # Panics
    ///
    /// Will panic if `position` is negative or not finite.
    ///
    /// ```should_panic
    /// let p = treeseq_core::Position::new_valid(-1.0);
    /// ```
    pub fn new_valid(position: f64) -> Self {
        match Self::new(position) {
            Some(p) => p,
            None => panic!("invalid position: {}", position),
        }
    }

    /// Like [`Position::new`], but reports invalid input
    /// as [`crate::Error::PositionError`].
    pub fn try_new(position: f64) -> Result<Self, crate::Error> {
        Self::new(position).ok_or(crate::Error::PositionError(position))
    }

    /// `true` if the value is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// The underlying value.
    pub fn raw(self) -> f64 {
        self.0
    }
}

impl_f64_newtype_comparisons!(Position);
