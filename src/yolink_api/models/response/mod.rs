pub mod device_list_response;
pub mod envelope;
pub mod general_info_response;
pub mod token_response;
