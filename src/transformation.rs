//! Geometric mappings from reference cells to physical elements and faces.
use crate::element::{FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::IntegrationPoint;
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// The map from a reference cell to a physical element, evaluated at a current point.
///
/// Jacobian-dependent queries refer to the point most recently passed to
/// [`set_integration_point`](Self::set_integration_point).
pub trait ElementTransformation<T: Real> {
    fn set_integration_point(&mut self, ip: &IntegrationPoint<T>);

    fn integration_point(&self) -> &IntegrationPoint<T>;

    fn reference_dim(&self) -> usize;

    fn space_dim(&self) -> usize;

    /// Whether the reference and physical dimensions agree.
    fn is_square(&self) -> bool {
        self.reference_dim() == self.space_dim()
    }

    /// The `space_dim x reference_dim` Jacobian at the current point.
    fn jacobian(&self) -> &DMatrix<T>;

    /// The signed Jacobian determinant for square maps, or the generalized volume factor
    /// `sqrt(det(J^T J))` otherwise.
    fn jacobian_determinant(&self) -> T;

    /// The volume element, `|det(J)|` for square maps and `sqrt(det(J^T J))` otherwise.
    ///
    /// This is never negative, also for elements whose orientation is reversed with respect to
    /// the reference cell.
    fn weight(&self) -> T {
        self.jacobian_determinant().abs()
    }

    /// `-1` for square maps that reverse orientation, `1` otherwise.
    fn orientation(&self) -> T {
        if self.jacobian_determinant() < T::zero() {
            -T::one()
        } else {
            T::one()
        }
    }

    /// Maps a reference point to physical coordinates.
    fn transform(&self, ip: &IntegrationPoint<T>) -> DVector<T>;

    /// The polynomial order of the map.
    fn order(&self) -> usize;

    /// The polynomial order of the entries of the Jacobian.
    fn order_j(&self) -> usize;

    /// The polynomial order of [`weight`](Self::weight).
    fn order_w(&self) -> usize;

    /// The polynomial order of the physical gradients of `fe`, scaled by the Jacobian determinant.
    fn order_grad(&self, fe: &dyn FiniteElement<T>) -> usize;
}

/// An element transformation defined by a nodal element and the physical coordinates of its
/// nodes.
pub struct IsoparametricTransformation<T: Real> {
    element: Box<dyn FiniteElement<T> + Send + Sync>,
    /// `space_dim x num_nodes`, one column per node.
    nodes: DMatrix<T>,
    ip: IntegrationPoint<T>,
    gradients: DMatrix<T>,
    basis: DVector<T>,
    jacobian: DMatrix<T>,
    determinant: T,
}

impl<T: Real> std::fmt::Debug for IsoparametricTransformation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsoparametricTransformation")
            .field("geometry", &self.element.geometry())
            .field("nodes", &self.nodes)
            .field("ip", &self.ip)
            .finish()
    }
}

impl<T: Real> IsoparametricTransformation<T> {
    /// Creates a transformation from an element and a `space_dim x num_dofs` matrix of node
    /// coordinates.
    pub fn new(element: impl FiniteElement<T> + Send + Sync + 'static, nodes: DMatrix<T>) -> Self {
        assert_eq!(
            nodes.ncols(),
            element.num_dofs(),
            "Number of node columns must match the number of element nodes"
        );
        assert!(
            nodes.nrows() >= element.dim(),
            "Physical dimension cannot be smaller than reference dimension"
        );
        let (n, dim, sdim) = (element.num_dofs(), element.dim(), nodes.nrows());
        let mut trans = Self {
            element: Box::new(element),
            nodes,
            ip: IntegrationPoint::default(),
            gradients: DMatrix::zeros(n, dim),
            basis: DVector::zeros(n),
            jacobian: DMatrix::zeros(sdim, dim),
            determinant: T::zero(),
        };
        let ip = trans.ip;
        trans.set_integration_point(&ip);
        trans
    }

    /// Creates a transformation from an element and a slice of node coordinates.
    pub fn from_vertices(element: impl FiniteElement<T> + Send + Sync + 'static, vertices: &[&[T]]) -> Self {
        let sdim = vertices.first().map(|v| v.len()).unwrap_or(0);
        let nodes = DMatrix::from_fn(sdim, vertices.len(), |i, j| vertices[j][i]);
        Self::new(element, nodes)
    }

    pub fn element(&self) -> &dyn FiniteElement<T> {
        self.element.as_ref()
    }

    pub fn nodes(&self) -> &DMatrix<T> {
        &self.nodes
    }
}

impl<T: Real> ElementTransformation<T> for IsoparametricTransformation<T> {
    fn set_integration_point(&mut self, ip: &IntegrationPoint<T>) {
        self.ip = *ip;
        self.element
            .populate_basis_gradients(ip, &mut self.gradients);
        self.jacobian
            .gemm(T::one(), &self.nodes, &self.gradients, T::zero());
        self.determinant = if self.is_square() {
            if self.jacobian.is_empty() {
                T::one()
            } else {
                self.jacobian.determinant()
            }
        } else if self.jacobian.ncols() == 0 {
            T::one()
        } else {
            self.jacobian.tr_mul(&self.jacobian).determinant().sqrt()
        };
    }

    fn integration_point(&self) -> &IntegrationPoint<T> {
        &self.ip
    }

    fn reference_dim(&self) -> usize {
        self.element.dim()
    }

    fn space_dim(&self) -> usize {
        self.nodes.nrows()
    }

    fn jacobian(&self) -> &DMatrix<T> {
        &self.jacobian
    }

    fn jacobian_determinant(&self) -> T {
        self.determinant
    }

    fn transform(&self, ip: &IntegrationPoint<T>) -> DVector<T> {
        let mut basis = self.basis.clone();
        self.element.populate_basis(ip, &mut basis);
        &self.nodes * basis
    }

    fn order(&self) -> usize {
        self.element.order()
    }

    fn order_j(&self) -> usize {
        let p = self.element.order();
        match self.element.space() {
            FunctionSpace::Pk => p.saturating_sub(1),
            FunctionSpace::Qk | FunctionSpace::RQk => p,
            space => panic!("Jacobian order is not defined for {:?} transformations", space),
        }
    }

    fn order_w(&self) -> usize {
        let p = self.element.order();
        let d = self.element.dim();
        match self.element.space() {
            FunctionSpace::Pk => d * p.saturating_sub(1),
            FunctionSpace::Qk | FunctionSpace::RQk => (d * p).saturating_sub(1),
            space => panic!("weight order is not defined for {:?} transformations", space),
        }
    }

    fn order_grad(&self, fe: &dyn FiniteElement<T>) -> usize {
        let k = self.element.order();
        let l = fe.order();
        let d = self.element.dim();
        let space = self.element.space();
        assert_eq!(
            fe.space(),
            space,
            "gradient order requires the element to share the function space of the transformation"
        );
        match space {
            FunctionSpace::Pk => k.saturating_sub(1) * d.saturating_sub(1) + l.saturating_sub(1),
            FunctionSpace::Qk | FunctionSpace::RQk => (k * d.saturating_sub(1) + l).saturating_sub(1),
            space => panic!("gradient order is not defined for {:?} transformations", space),
        }
    }
}

/// An affine map from the reference cell of a face into the reference cell of an adjacent
/// element, `x -> origin + matrix x`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineFaceMap<T: Real> {
    origin: DVector<T>,
    matrix: DMatrix<T>,
}

impl<T: Real> AffineFaceMap<T> {
    pub fn new(origin: DVector<T>, matrix: DMatrix<T>) -> Self {
        assert_eq!(origin.len(), matrix.nrows());
        assert!(origin.len() <= 3);
        Self { origin, matrix }
    }

    /// Constructs the map sending the vertices of the face's reference cell (in the order
    /// origin, then the unit directions) to the given element reference coordinates.
    pub fn from_vertices(vertices: &[&[T]]) -> Self {
        assert!(!vertices.is_empty(), "a face map needs at least one vertex");
        let origin = DVector::from_column_slice(vertices[0]);
        let n = origin.len();
        let matrix = DMatrix::from_fn(n, vertices.len() - 1, |i, j| vertices[j + 1][i] - origin[i]);
        Self::new(origin, matrix)
    }

    pub fn transform(&self, ip: &IntegrationPoint<T>) -> IntegrationPoint<T> {
        let face_coords = ip.coords();
        let mut x = self.origin.clone();
        for (j, column) in self.matrix.column_iter().enumerate() {
            x.axpy(face_coords[j], &column, T::one());
        }
        IntegrationPoint::new(x.as_slice(), ip.weight)
    }
}

/// The mappings associated with a face: the face itself and the one or two elements sharing it.
///
/// The face normal computed from the face Jacobian points out of the first element.
pub trait FaceTransformation<T: Real> {
    fn face_geometry(&self) -> Geometry;

    fn face(&self) -> &dyn ElementTransformation<T>;

    fn face_mut(&mut self) -> &mut dyn ElementTransformation<T>;

    fn elem1(&self) -> &dyn ElementTransformation<T>;

    fn elem1_mut(&mut self) -> &mut dyn ElementTransformation<T>;

    /// The second element, or `None` on a boundary face.
    fn elem2(&self) -> Option<&dyn ElementTransformation<T>>;

    fn elem2_mut(&mut self) -> Option<&mut dyn ElementTransformation<T>>;

    /// Maps a point on the face reference cell into the reference cell of the first element.
    fn to_elem1(&self, ip: &IntegrationPoint<T>) -> IntegrationPoint<T>;

    /// Maps a point on the face reference cell into the reference cell of the second element.
    fn to_elem2(&self, ip: &IntegrationPoint<T>) -> Option<IntegrationPoint<T>>;

    fn is_interior(&self) -> bool {
        self.elem2().is_some()
    }

    /// Sets the current point of the face and of both elements, given a point on the face.
    fn set_integration_point(&mut self, ip: &IntegrationPoint<T>) {
        let eip1 = self.to_elem1(ip);
        let eip2 = self.to_elem2(ip);
        self.face_mut().set_integration_point(ip);
        self.elem1_mut().set_integration_point(&eip1);
        if let (Some(elem2), Some(eip2)) = (self.elem2_mut(), eip2) {
            elem2.set_integration_point(&eip2);
        }
    }
}

/// A face shared by one or two isoparametric elements.
#[derive(Debug)]
pub struct FaceElementTransformations<T: Real> {
    face: IsoparametricTransformation<T>,
    elem1: IsoparametricTransformation<T>,
    loc1: AffineFaceMap<T>,
    elem2: Option<(IsoparametricTransformation<T>, AffineFaceMap<T>)>,
}

impl<T: Real> FaceElementTransformations<T> {
    /// A boundary face of `elem1`.
    pub fn boundary(
        face: IsoparametricTransformation<T>,
        elem1: IsoparametricTransformation<T>,
        loc1: AffineFaceMap<T>,
    ) -> Self {
        assert_eq!(
            face.reference_dim() + 1,
            elem1.reference_dim(),
            "face must have one dimension less than the element"
        );
        Self {
            face,
            elem1,
            loc1,
            elem2: None,
        }
    }

    /// An interior face shared by `elem1` and `elem2`.
    pub fn interior(
        face: IsoparametricTransformation<T>,
        elem1: IsoparametricTransformation<T>,
        loc1: AffineFaceMap<T>,
        elem2: IsoparametricTransformation<T>,
        loc2: AffineFaceMap<T>,
    ) -> Self {
        let mut trans = Self::boundary(face, elem1, loc1);
        assert_eq!(elem2.reference_dim(), trans.elem1.reference_dim());
        trans.elem2 = Some((elem2, loc2));
        trans
    }
}

impl<T: Real> FaceTransformation<T> for FaceElementTransformations<T> {
    fn face_geometry(&self) -> Geometry {
        self.face.element().geometry()
    }

    fn face(&self) -> &dyn ElementTransformation<T> {
        &self.face
    }

    fn face_mut(&mut self) -> &mut dyn ElementTransformation<T> {
        &mut self.face
    }

    fn elem1(&self) -> &dyn ElementTransformation<T> {
        &self.elem1
    }

    fn elem1_mut(&mut self) -> &mut dyn ElementTransformation<T> {
        &mut self.elem1
    }

    fn elem2(&self) -> Option<&dyn ElementTransformation<T>> {
        self.elem2
            .as_ref()
            .map(|(elem2, _)| elem2 as &dyn ElementTransformation<T>)
    }

    fn elem2_mut(&mut self) -> Option<&mut dyn ElementTransformation<T>> {
        self.elem2
            .as_mut()
            .map(|(elem2, _)| elem2 as &mut dyn ElementTransformation<T>)
    }

    fn to_elem1(&self, ip: &IntegrationPoint<T>) -> IntegrationPoint<T> {
        self.loc1.transform(ip)
    }

    fn to_elem2(&self, ip: &IntegrationPoint<T>) -> Option<IntegrationPoint<T>> {
        self.elem2
            .as_ref()
            .map(|(_, loc2)| loc2.transform(ip))
    }
}
