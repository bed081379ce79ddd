//! GET /get-ip-info

use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Responder, web};
use tracing::{trace, warn};

use crate::errors::IpDistanceError;
use crate::services::DistanceService;

/// 查询参数，缺失与空字符串等价
#[derive(Debug, Default)]
pub struct IpInfoQuery {
    pub ip1: Option<String>,
    pub ip2: Option<String>,
}

impl IpInfoQuery {
    /// 同名参数重复出现时取第一个，其余参数忽略
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "ip1" => &mut query.ip1,
                "ip2" => &mut query.ip2,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

pub struct IpInfoService;

impl IpInfoService {
    pub async fn get_ip_info(
        query: web::Query<Vec<(String, String)>>,
        service: web::Data<Arc<DistanceService>>,
    ) -> impl Responder {
        let query = IpInfoQuery::from_pairs(query.into_inner());
        let request =
            match DistanceService::validate_request(query.ip1.as_deref(), query.ip2.as_deref()) {
                Ok(request) => request,
                Err(e) => {
                    trace!("Rejected request: {}", e.message());
                    return Self::error_response(&e);
                }
            };

        match service.lookup(&request).await {
            Ok(response) => HttpResponse::Ok().json(response),
            Err(e) => {
                warn!(
                    "get-ip-info {}|{} failed: {}",
                    request.ip1,
                    request.ip2,
                    e.format_simple()
                );
                Self::error_response(&e)
            }
        }
    }

    fn error_response(err: &IpDistanceError) -> HttpResponse {
        HttpResponse::build(err.status_code())
            .content_type(ContentType::plaintext())
            .body(err.public_message())
    }
}

/// IP 距离路由
pub fn ip_info_routes() -> actix_web::Scope {
    web::scope("").route("/get-ip-info", web::get().to(IpInfoService::get_ip_info))
}
