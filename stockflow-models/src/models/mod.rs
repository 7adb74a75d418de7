mod ecology;
mod epidemic;
mod goodwin;
mod keen;
mod spring;
mod turchin;

pub use ecology::LotkaVolterra;
pub use epidemic::Sir;
pub use goodwin::GoodwinCycle;
pub use keen::KeenCycle;
pub use spring::Spring;
pub use turchin::TurchinState;
