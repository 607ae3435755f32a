use crate::element::FiniteElement;
use crate::integrators::BilinearFormIntegrator;
use crate::transformation::ElementTransformation;
use crate::Real;
use nalgebra::DVector;

/// Flux recovery for a posteriori error estimation.
///
/// The flux of an element solution is sampled at the nodes of an auxiliary (typically
/// discontinuous, vector-valued) flux element. Fluxes are stored component by component:
/// component `k` of the flux at node `i` is `flux[k * n + i]`, where `n` is the number of
/// nodes of the flux element.
pub trait FluxIntegrator<T: Real>: BilinearFormIntegrator<T> {
    /// Recovers the flux of the element solution `u` at the nodes of `flux_element`.
    ///
    /// If `with_coefficient` is false, the raw physical gradient is stored instead of the
    /// coefficient-weighted flux.
    fn compute_element_flux(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        u: &DVector<T>,
        flux_element: &dyn FiniteElement<T>,
        flux: &mut DVector<T>,
        with_coefficient: bool,
    ) -> eyre::Result<()>;

    /// Integrates the coefficient-weighted squared norm of a recovered flux over the element.
    fn compute_flux_energy(
        &self,
        flux_element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        flux: &DVector<T>,
    ) -> eyre::Result<T>;
}
