//! Hifz Tracker - halaqa 背诵与复习跟踪服务
//!
//! 基于 Actix Web 构建：教师布置 ayah 范围的背诵 / 复习任务，
//! 学生上传录音，教师按 hifdh 与规则两项打分，首页汇总进度与出勤。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证、角色、halaqa 教师与限流中间件
//! - `models`: 数据模型定义
//! - `policy`: 评分与统计常量
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod policy;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
