mod convection;
mod dg;
mod quadrature;
mod util;
mod vector;
mod workspace;
