use crate::{
    config::Config,
    services::{
        database::Database, department::DepartmentService, it_account::ItAccountService,
        pc_laptop::PcLaptopService,
    },
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Database,

    /// IT 账号服务
    pub it_account_service: ItAccountService,

    /// 部门服务
    pub department_service: DepartmentService,

    /// 电脑资产服务
    pub pc_laptop_service: PcLaptopService,
}

impl AppState {
    /// 基于已连接（或连接失败）的数据库构建全部服务
    pub async fn new(config: Config, db: Arc<Database>) -> crate::error::Result<Self> {
        let it_account_service = ItAccountService::new(db.clone()).await?;
        let department_service = DepartmentService::new(db.clone()).await?;
        let pc_laptop_service = PcLaptopService::new(db.clone()).await?;

        Ok(Self {
            config,
            db: (*db).clone(),
            it_account_service,
            department_service,
            pc_laptop_service,
        })
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }
}
