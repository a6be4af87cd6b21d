/// Trait for surfacing latent errors from a value before it is sent
pub trait Prepare {
    /// The resulting error-free type
    type Output;
    /// The error held by `self`
    type Error;

    /// Return any latent errors within `self`, else return a validated
    /// version of `self`
    ///
    /// # Errors
    /// This function should return an error if `self` contains any errors
    fn prepare(self) -> Result<Self::Output, Self::Error>;
}

impl<T: Prepare> Prepare for Option<T> {
    type Error = T::Error;
    type Output = Option<T::Output>;

    fn prepare(self) -> Result<Self::Output, Self::Error> { self.map(T::prepare).transpose() }
}
